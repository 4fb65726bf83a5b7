use std::fs;
use std::path::Path;

fn write_minimal_env_template(file: &mut fs::File) -> std::io::Result<()> {
    use std::io::Write;
    writeln!(file, "# Tea Swarm configuration")?;
    writeln!(file)?;
    writeln!(file, "USE_PROXY=\"false\"")?;
    writeln!(file, "MAX_CONCURRENCY_WITH_PROXY=\"10\"")?;
    writeln!(file, "MAX_CONCURRENCY_NO_PROXY=\"5\"")?;
    writeln!(file, "AMOUNT_TRANSFER_RANGE=\"0.0001,0.001\"")?;
    writeln!(file, "AMOUNT_STAKE_RANGE=\"0.01,0.05\"")?;
    writeln!(file, "NUMBER_OF_DAILY_TRANSFERS=\"100\"")?;
    writeln!(file, "DELAY_BETWEEN_REQUESTS_RANGE=\"1,5\"")?;
    writeln!(file, "START_DELAY_RANGE=\"1,30\"")?;
    writeln!(file, "ESTIMATED_GAS=\"100000\"")?;
    writeln!(file)?;
    writeln!(file, "RUST_LOG=\"info\"")?;
    Ok(())
}

fn load_dot_env() {
    let path = Path::new(".env");
    if !path.exists() {
        return;
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[ENV] Failed to read .env: {}", e);
            return;
        }
    };

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };

        // Real environment always wins over the .env file.
        if std::env::var_os(key.trim()).is_some() {
            continue;
        }

        let value_no_comment = value.split('#').next().unwrap_or("").trim();
        let parsed = if value_no_comment.len() >= 2
            && ((value_no_comment.starts_with('"') && value_no_comment.ends_with('"'))
                || (value_no_comment.starts_with('\'') && value_no_comment.ends_with('\'')))
        {
            &value_no_comment[1..value_no_comment.len() - 1]
        } else {
            value_no_comment
        };

        std::env::set_var(key.trim(), parsed);
    }
}

fn ensure_env_files_exist() {
    let env_example = Path::new(".env.example");
    if !env_example.exists() {
        if let Ok(mut file) = fs::File::create(env_example) {
            let _ = write_minimal_env_template(&mut file);
        }
    }
}

/// Seed `.env.example` on first run and merge `.env` into the process
/// environment without overriding explicitly exported variables.
pub fn harden_env_setup() {
    ensure_env_files_exist();
    load_dot_env();
}
