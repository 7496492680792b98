use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    root: Option<PathBuf>,
    shuffle: bool,
    repeat: bool,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    quaver::app::run(quaver::app::AppOptions {
        root: args.root.unwrap_or_else(|| PathBuf::from(".")),
        shuffle: args.shuffle,
        repeat: args.repeat,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    for arg in args {
        match arg.as_str() {
            "--shuffle" => out.shuffle = true,
            "--repeat" => out.repeat = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => anyhow::bail!("unknown argument {other}"),
            other => {
                if out.root.is_some() {
                    anyhow::bail!("only one music directory may be given");
                }
                out.root = Some(PathBuf::from(other));
            }
        }
    }
    Ok(out)
}

fn print_help() {
    println!("Quaver");
    println!("  quaver [DIRECTORY]   Play the audio files under DIRECTORY (default .)");
    println!("  --shuffle            Start with shuffle enabled");
    println!("  --repeat             Start with repeat enabled");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directory_and_flags() {
        let args = parse_args(vec![
            String::from("--shuffle"),
            String::from("music"),
            String::from("--repeat"),
        ])
        .expect("parse");
        assert_eq!(args.root, Some(PathBuf::from("music")));
        assert!(args.shuffle);
        assert!(args.repeat);
    }

    #[test]
    fn rejects_unknown_flags_and_extra_directories() {
        assert!(parse_args(vec![String::from("--loudness")]).is_err());
        assert!(parse_args(vec![String::from("a"), String::from("b")]).is_err());
    }
}
