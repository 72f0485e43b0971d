use colored::Colorize;
use std::process::ExitCode;
use tagconf::{ConfigError, ConfigStore, StoreLayout};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let result = match args.as_slice() {
        ["show", file] => show(file),
        ["tags", file] => tags(file),
        ["get", file, tag, key] => get(file, tag, key),
        ["set", file, tag, key, value] => set(file, tag, key, value),
        ["sort", file] => sort(file),
        [] => {
            usage();
            return ExitCode::SUCCESS;
        }
        [command, ..] => {
            println!(
                "unknown command: {}. Available: show, tags, get, set, sort",
                command
            );
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn usage() {
    println!("Usage: tagconf-cli [command]");
    println!("Commands:");
    println!("  show <file>                    - Print the normalized configuration");
    println!("  tags <file>                    - List tags and their key counts");
    println!("  get <file> <tag> <key>         - Print one raw value");
    println!("  set <file> <tag> <key> <value> - Set one raw value and rewrite the file");
    println!("  sort <file>                    - Rewrite the file with sorted tags and keys");
}

fn open(file: &str, layout: StoreLayout) -> Result<ConfigStore, ConfigError> {
    let mut store = ConfigStore::with_layout(layout);
    store.load_file(file)?;
    Ok(store)
}

fn show(file: &str) -> Result<(), ConfigError> {
    let store = open(file, StoreLayout::default())?;
    print!("{}", store);
    Ok(())
}

fn tags(file: &str) -> Result<(), ConfigError> {
    let store = open(file, StoreLayout::default())?;
    for tag in store.tags() {
        println!("{} ({} keys)", tag.magenta().bold(), store.keys(tag)?.count());
    }
    Ok(())
}

fn get(file: &str, tag: &str, key: &str) -> Result<(), ConfigError> {
    let store = open(file, StoreLayout::default())?;
    let value: String = store.get_value(tag, key)?;
    println!("{}", value);
    Ok(())
}

fn set(file: &str, tag: &str, key: &str, value: &str) -> Result<(), ConfigError> {
    let mut store = open(file, StoreLayout::default())?;
    store.add_tag(tag);
    store.set_raw(tag, key, value)?;
    store.save_file(file)?;
    println!("{} [{}] {} = {}", "✓".green(), tag, key, value.cyan());
    Ok(())
}

fn sort(file: &str) -> Result<(), ConfigError> {
    let store = open(file, StoreLayout::sorted())?;
    store.save_file(file)?;
    println!("{} Sorted {}", "✓".green(), file);
    Ok(())
}
