use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use owl_core::decode;

fn main() -> ExitCode {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> Result<(), String> {
    let root = PathBuf::from("tests").join("golden");
    let entries =
        fs::read_dir(&root).map_err(|err| format!("failed to read {}: {}", root.display(), err))?;

    for entry in entries {
        let entry = entry.map_err(|err| format!("failed to read entry: {}", err))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let input = path.join("input.xml");
        if !input.exists() {
            continue;
        }
        regenerate_one(&input, &path)?;
    }

    Ok(())
}

fn regenerate_one(input: &Path, dir: &Path) -> Result<(), String> {
    let packet =
        fs::read(input).map_err(|err| format!("failed to read {}: {}", input.display(), err))?;
    let reading_path = dir.join("expected_reading.json");
    let error_path = dir.join("expected_error.txt");

    let (output, contents, stale) = match decode(&packet) {
        Ok(reading) => {
            let json = serde_json::to_string(&reading)
                .map_err(|err| format!("JSON serialization failed: {}", err))?;
            (reading_path, json, error_path)
        }
        Err(err) => (error_path, err.to_string(), reading_path),
    };

    fs::write(&output, contents)
        .map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    if stale.exists() {
        fs::remove_file(&stale)
            .map_err(|err| format!("failed to remove {}: {}", stale.display(), err))?;
    }
    Ok(())
}
