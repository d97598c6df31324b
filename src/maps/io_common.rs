use crate::maps::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Resolves a path given in a configuration file against the directory of that file.
pub fn resolve_path(root: &Path, path: &str) -> String {
    let p: PathBuf = [root, Path::new(path)].iter().collect();
    p.as_path().display().to_string()
}

pub fn read_text(path: &str) -> BMapResult<String> {
    info!("Attempting to read file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_text: {} bytes from {:?}", contents.len(), path);
    Ok(contents)
}

/// Writes the output, replacing any previous content. `stdout` prints it instead.
pub fn write_output(path: Option<&str>, contents: &str) -> BMapResult<()> {
    match path {
        None | Some("") | Some("stdout") => {
            println!("{}", contents);
        }
        Some(p) => {
            info!("Writing render model to {:?}", p);
            fs::write(p, contents).context(WritingFileSnafu { path: p })?;
        }
    }
    Ok(())
}
