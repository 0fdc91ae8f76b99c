fn build_constants() -> miette::Result<()> {
    let out_dir: std::path::PathBuf = std::env::var("OUT_DIR")
        .map_err(|e| miette::miette!("OUT_DIR not set: {e}"))?
        .into();
    let mut code = Vec::new();
    println!("cargo:rerun-if-env-changed=CM_WIDTH_BITS");
    println!("cargo:rerun-if-env-changed=CM_ROWS");

    let width_bits: u32 = std::env::var("CM_WIDTH_BITS")
        .unwrap_or_else(|_| "24".into())
        .parse()
        .map_err(|e| miette::miette!("Failed to parse CM_WIDTH_BITS: {e}"))?;
    if !(1..=32).contains(&width_bits) {
        miette::bail!("CM_WIDTH_BITS must be in 1..=32, got {width_bits}");
    }
    let hash_per_hash = 64 / width_bits as usize;

    let rows: usize = std::env::var("CM_ROWS")
        .unwrap_or_else(|_| "4".into())
        .parse()
        .map_err(|e| miette::miette!("Failed to parse CM_ROWS: {e}"))?;
    if rows == 0 || rows % hash_per_hash != 0 {
        miette::bail!(
            "CM_ROWS ({rows}) must be a non-zero multiple of hash_per_hash ({hash_per_hash})"
        );
    }

    code.push(format!("pub const TABLE_WIDTH_BITS: u32 = {width_bits};"));
    code.push(format!("pub const TABLE_ROWS: usize = {rows};"));

    std::fs::write(out_dir.join("constants.rs"), code.join("\n"))
        .map_err(|e| miette::miette!("Failed to write const file: {e}"))?;
    Ok(())
}

fn main() -> miette::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    build_constants()
}
