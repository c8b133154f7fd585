use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok().map(|s| s.trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=../../.git/HEAD");

    // Shown by `shipcost --version`
    let hash = git_short_hash().unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=SHIPCOST_GIT_HASH={hash}");
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".into());
    println!("cargo:rustc-env=SHIPCOST_TARGET={target}");
}
