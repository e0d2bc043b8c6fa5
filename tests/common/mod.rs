#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

pub use callbackd_test_utils::builders;
pub use callbackd_test_utils::{init_tracing, with_timeout};

/// Write `contents` to a fresh temporary `.json` file.
pub fn config_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

/// Template that records its three trailing arguments, one per line, into
/// `out`. Ends with a comment so comment stripping is exercised too.
pub fn recorder_command(out: &Path) -> String {
    format!(
        "sh -c 'printf \"%s\\n\" \"$0\" \"$1\" \"$2\" > {}' # subject event kwargs",
        out.display()
    )
}
