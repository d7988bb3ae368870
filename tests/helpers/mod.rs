#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::{
    fs::{create_dir_all, write},
    path::Path,
};

use snapbox::{
    Assert,
    cmd::{Command, OutputAssert},
};

/// Every variable the binary reads, so a pipeline running these tests can't leak into them.
const INPUTS: &[&str] = &[
    "PLUGIN_API_KEY",
    "PLUGIN_API_KEY_FILE",
    "PLUGIN_GITEA_SERVER",
    "DRONE_REPO_LINK",
    "DRONE_GIT_HTTP_URL",
    "DRONE_REPO_NAMESPACE",
    "DRONE_REPO_NAME",
    "DRONE_COMMIT",
    "PLUGIN_TAG",
    "PLUGIN_TAG_FILE",
    "PLUGIN_TITLE",
    "PLUGIN_TITLE_FILE",
    "PLUGIN_BODY",
    "PLUGIN_BODY_FILE",
    "PLUGIN_FILES",
];

/// The binary, run in `working_dir` with none of its inputs set.
pub fn gitea_release(working_dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gitea-release"))
        .current_dir(working_dir)
        .env("NO_COLOR", "1");
    for name in INPUTS {
        command = command.env_remove(name);
    }
    command
}

/// The usual variables of a Drone pipeline for `octo/widgets` on `gitea.example.com`.
pub fn with_pipeline_env(command: Command) -> Command {
    command
        .env("DRONE_REPO_LINK", "https://gitea.example.com/octo/widgets")
        .env("DRONE_REPO_NAMESPACE", "octo")
        .env("DRONE_REPO_NAME", "widgets")
        .env("DRONE_COMMIT", "0123456789abcdef")
        .env("PLUGIN_API_KEY", "secret-token")
}

/// Create `relative` under `root` (and any missing parents), containing its own path.
pub fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    create_dir_all(path.parent().unwrap()).unwrap();
    write(path, relative).unwrap();
}

/// Compare output against the files under `tests/`, `SNAPSHOTS=overwrite` updates them.
pub fn assert() -> Assert {
    Assert::new().action_env("SNAPSHOTS")
}

pub fn stderr(assert: &OutputAssert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}
