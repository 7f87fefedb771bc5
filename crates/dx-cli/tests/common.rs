#![allow(dead_code)]

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;

/// A `dx` command isolated from the caller's `DX_*` settings.
pub fn dx() -> Command {
    let mut cmd = cargo_bin_cmd!("dx");
    for key in [
        "DX_INDEX_URL",
        "DX_INDEX_NAME",
        "DX_PYTHON_VERSION",
        "DX_PLATFORM",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

pub fn parse_json(assert: &Assert) -> Value {
    let output = assert.get_output();
    serde_json::from_slice(&output.stdout).expect("json output")
}
