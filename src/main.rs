use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};

use kodegen_bundler_trust::config::{BootstrapConfig, DEFAULT_KEYCHAIN_PASSWORD_ENV};
use kodegen_bundler_trust::macos::keychain::DEFAULT_SECURITY_PATH;
use kodegen_bundler_trust::{
    Certificate, Level, Reporter, SecurityController, SystemCommandRunner, TerminalReporter, macos,
};

#[derive(Parser)]
#[command(name = "kodegen_trust")]
#[command(version, about = "Bootstrap keychain trust for kodegen build machines")]
struct Cli {
    /// Print every step, including skipped ones
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Path to the `security` executable [default: /usr/bin/security]
    #[arg(long, global = true)]
    security_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a CMS-signed document (e.g. a provisioning profile) to stdout
    Decode {
        /// Signed document to decode
        path: PathBuf,
    },

    /// Import a certificate and its private key, skipping what is already present
    Import {
        /// Certificate file
        #[arg(long)]
        certificate: PathBuf,

        /// Private key file paired with the certificate
        #[arg(long)]
        private_key: PathBuf,

        /// Keychain to import into
        #[arg(long)]
        keychain: PathBuf,
    },

    /// Create a keychain (no-op if it already exists)
    CreateKeychain(KeychainArgs),

    /// Unlock a keychain
    UnlockKeychain(KeychainArgs),

    /// Lock a keychain
    LockKeychain(KeychainArgs),

    /// Create, unlock and populate a keychain from a config file (TOML)
    Bootstrap {
        /// Path to bootstrap config file
        #[arg(long, short = 'c')]
        config: PathBuf,

        /// Print the plan without running `security`
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the resolved bootstrap configuration and plan
    Show {
        /// Path to bootstrap config file
        #[arg(long, short = 'c')]
        config: PathBuf,
    },
}

#[derive(Args)]
struct KeychainArgs {
    /// Keychain file
    path: PathBuf,

    /// Keychain password
    #[arg(
        long,
        short = 'p',
        env = DEFAULT_KEYCHAIN_PASSWORD_ENV,
        default_value = "",
        hide_env_values = true
    )]
    password: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let reporter = TerminalReporter::new(cli.verbose);

    if let Err(e) = run(cli, reporter).await {
        reporter.log(Level::Error, &format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, reporter: TerminalReporter) -> Result<()> {
    let executable = cli
        .security_path
        .clone()
        .unwrap_or_else(|| DEFAULT_SECURITY_PATH.to_string());
    let controller =
        SecurityController::new(SystemCommandRunner, reporter).with_executable(executable);

    match cli.command {
        Command::Decode { path } => {
            let decoded = controller.decode_signed_document(&path).await?;
            std::io::stdout().write_all(decoded.as_bytes())?;
        }
        Command::Import {
            certificate,
            private_key,
            keychain,
        } => {
            let certificate = Certificate::new(certificate, private_key);
            controller.import_certificate(&certificate, &keychain).await?;
            reporter.log(Level::Info, &format!("Certificate ready in {}", keychain.display()));
        }
        Command::CreateKeychain(args) => {
            controller.create_keychain(&args.path, &args.password).await?;
            reporter.log(Level::Info, &format!("Keychain ready at {}", args.path.display()));
        }
        Command::UnlockKeychain(args) => {
            controller.unlock_keychain(&args.path, &args.password).await?;
            reporter.log(Level::Info, &format!("Unlocked {}", args.path.display()));
        }
        Command::LockKeychain(args) => {
            controller.lock_keychain(&args.path, &args.password).await?;
            reporter.log(Level::Info, &format!("Locked {}", args.path.display()));
        }
        Command::Bootstrap { config, dry_run } => {
            let mut config = load_config(&config, cli.security_path.as_deref()).await?;
            config.dry_run |= dry_run;
            config.verbose |= cli.verbose;
            macos::setup_from_config(&config).await?;
        }
        Command::Show { config } => {
            let config = load_config(&config, cli.security_path.as_deref()).await?;
            macos::show_config(&config);
        }
    }

    Ok(())
}

/// Load a bootstrap config; an explicit `--security-path` overrides the file.
async fn load_config(path: &Path, security_path: Option<&str>) -> Result<BootstrapConfig> {
    let mut config = BootstrapConfig::from_file(path).await?;
    config.override_security_path(security_path);
    Ok(config)
}
