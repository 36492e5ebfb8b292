use anyhow::Context;

use crate::config::{user_config_path, ExtractorConfig};

pub fn export(output: Option<&str>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&ExtractorConfig::default())?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n")).with_context(|| format!("writing {path}"))?;
            println!("Wrote {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn path() -> anyhow::Result<()> {
    let path = user_config_path();
    println!("{}", path.display());
    if !path.exists() {
        println!("(not present; built-in tables are used)");
    }
    Ok(())
}
