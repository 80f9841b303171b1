use clap::Parser;
use cosign_image_signer::{
    config::SignerConfig,
    cosign::{CosignCli, ImageSigner, SignRequest},
    error::AppError,
    output::OutputFormat,
    report::ExportReport,
    secrets::SecretStore,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cosign-image-signer")]
#[command(about = "Sign a built image with every mounted cosign secret")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub enum Cli {
    /// Sign the exported image once per cosign secret
    Sign {
        /// Lifecycle export report; the first image tag is signed
        #[arg(short, long, required_unless_present = "image", conflicts_with = "image")]
        report: Option<String>,
        /// Image reference to sign instead of reading a report
        #[arg(short, long)]
        image: Option<String>,
        /// Signer configuration file
        #[arg(short, long)]
        config: Option<String>,
        /// Directory holding one subdirectory per cosign secret
        #[arg(long, env = "SECRETS_DIR")]
        secrets_dir: Option<PathBuf>,
        /// Signature annotation, as key=value
        #[arg(short = 'a', long = "annotation", value_parser = parse_key_value)]
        annotations: Vec<(String, String)>,
        /// Destination repository for a secret, as secret=repository
        #[arg(long = "repository", value_parser = parse_key_value)]
        repositories: Vec<(String, String)>,
        /// Docker media types switch for a secret, as secret=bool
        #[arg(long = "docker-media-types", value_parser = parse_key_value)]
        docker_media_types: Vec<(String, String)>,
        /// Path of the cosign binary
        #[arg(long, env = "COSIGN_BINARY")]
        cosign_binary: Option<String>,
        /// Also export COSIGN_REPOSITORY and COSIGN_DOCKER_MEDIA_TYPES while signing
        #[arg(long)]
        export_env: bool,
    },
    /// List the cosign secrets that would be used for signing
    ListKeys {
        /// Signer configuration file
        #[arg(short, long)]
        config: Option<String>,
        /// Directory holding one subdirectory per cosign secret
        #[arg(long, env = "SECRETS_DIR")]
        secrets_dir: Option<PathBuf>,
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Parse a `key=value` pair; the value may itself contain `=`
fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got: {input}"))?;

    if key.is_empty() {
        return Err(format!("empty key in: {input}"));
    }

    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cosign_image_signer=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli {
        Cli::Sign {
            report,
            image,
            config,
            secrets_dir,
            annotations,
            repositories,
            docker_media_types,
            cosign_binary,
            export_env,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_overrides(&mut config, secrets_dir, cosign_binary, export_env);
            config.annotations.extend(annotations);
            config.repositories.extend(repositories);
            config.docker_media_types.extend(docker_media_types);
            config.validate()?;

            handle_sign_command(config, report, image).await
        }
        Cli::ListKeys {
            config,
            secrets_dir,
            format,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_overrides(&mut config, secrets_dir, None, false);

            let secrets = SecretStore::new(&config.secrets_dir).secrets()?;
            println!("{}", format.format_secrets(&secrets));
            Ok(())
        }
    }
}

fn load_config(path: Option<&str>) -> Result<SignerConfig, AppError> {
    match path {
        Some(path) => Ok(SignerConfig::from_file(path)?),
        None => Ok(SignerConfig::default()),
    }
}

fn apply_overrides(
    config: &mut SignerConfig,
    secrets_dir: Option<PathBuf>,
    cosign_binary: Option<String>,
    export_env: bool,
) {
    if let Some(secrets_dir) = secrets_dir {
        config.secrets_dir = secrets_dir;
    }

    if let Some(binary) = cosign_binary {
        config.cosign.binary = binary;
    }

    if export_env {
        config.export_environment = true;
    }
}

/// The report to sign: read from `report`, or built around a bare `image`.
/// With neither, the report has no image and signing fails on it.
fn export_report(
    report: Option<String>,
    image: Option<String>,
) -> Result<ExportReport, AppError> {
    match report {
        Some(path) => Ok(ExportReport::from_file(path)?),
        None => Ok(image.map(ExportReport::for_tag).unwrap_or_default()),
    }
}

async fn handle_sign_command(
    config: SignerConfig,
    report: Option<String>,
    image: Option<String>,
) -> Result<(), AppError> {
    let report = export_report(report, image)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling signing");
            trigger.cancel();
        }
    });

    info!(
        "Signing with secrets from {} using {}",
        config.secrets_dir.display(),
        config.cosign.binary
    );

    let signer = ImageSigner::new(CosignCli::new(config.cosign.binary.clone()))
        .with_export_environment(config.export_environment);
    signer
        .sign(
            &cancel,
            &report,
            &config.secrets_dir,
            &SignRequest::from(&config),
        )
        .await?;

    info!("Image signed with every cosign secret");
    Ok(())
}
