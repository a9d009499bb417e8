use typed_path::Utf8NativePathBuf;

// For argp::FromArgs
pub fn native_path(value: &str) -> Result<Utf8NativePathBuf, String> {
    Ok(Utf8NativePathBuf::from(value))
}

pub fn read_file(path: &Utf8NativePathBuf) -> anyhow::Result<Vec<u8>> {
    use anyhow::Context;
    std::fs::read(path.with_platform_encoding()).with_context(|| format!("Failed to read {}", path))
}
