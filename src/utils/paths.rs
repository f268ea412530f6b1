use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\-]+").expect("valid slug pattern"));

/// 把查询转成适合作为目录名的片段，最多取前 40 个字符
pub fn query_slug(query: &str) -> String {
    let head: String = query.chars().take(40).collect();
    let slug = UNSAFE_CHARS.replace_all(head.trim(), "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug.to_string()
    }
}

/// 单次运行的输出目录：`<root>/run_<时间戳>_<查询片段>`
pub fn run_output_dir(root: &Path, query: &str, timestamp: i64) -> PathBuf {
    root.join(format!("run_{}_{}", timestamp, query_slug(query)))
}
