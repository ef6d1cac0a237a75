use std::path::PathBuf;

const USAGE: &str = "\
Usage:
  azsql-deploy --wizard-smoke
  azsql-deploy --generate-notebook=<answers.toml> [--config=<settings.toml>] [--out=<path>]";

fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    args.iter()
        .find_map(|a| a.strip_prefix(prefix.as_str()))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }

    // Deterministic cascade proof over canned Azure responses.
    // Writes `wizard_cascade_smoke_transcript.log` under the log folder and exits 0/1.
    if args.iter().any(|a| a == "--wizard-smoke") {
        azure_sql_deploy::run_wizard_smoke();
        return;
    }

    if let Some(answers) = flag_value(&args, "--generate-notebook") {
        azure_sql_deploy::run_generate_notebook(
            PathBuf::from(answers),
            flag_value(&args, "--config").map(PathBuf::from),
            flag_value(&args, "--out").map(PathBuf::from),
        );
        return;
    }

    eprintln!("{}", USAGE);
    std::process::exit(2);
}
