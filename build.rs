use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let describe = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output();
    if let Ok(output) = describe {
        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("cargo:rustc-env=GANTRY_VERSION={}", version.trim());
        }
    }
}
