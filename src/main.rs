//! veilfs - Transparent encryption mirror filesystem
//!
//! Usage:
//!   veilfs <passphrase> <mirror_root> <mount_point> [mount_options...]
//!
//! Everything under <mirror_root> appears decrypted below <mount_point>
//! until the filesystem is unmounted.

use clap::Parser;
use fuser::MountOption;
use std::path::PathBuf;
use std::process;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use veilfs::crypto::{KdfParams, PassphraseCipher};
use veilfs::fs::VeilFs;
use veilfs::MountContext;
use zeroize::Zeroize;

#[derive(Parser)]
#[command(name = "veilfs")]
#[command(version)]
#[command(about = "Mirror a directory tree with transparent content encryption")]
struct Cli {
    /// Passphrase protecting all file content under the mount
    passphrase: String,

    /// Directory holding the encrypted backing files
    mirror_root: PathBuf,

    /// Directory to mount the decrypted view on
    mount_point: PathBuf,

    /// Additional options handed to the FUSE layer (e.g. allow_other)
    #[arg(trailing_var_arg = true)]
    mount_options: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_mount_option(opt: &str) -> MountOption {
    match opt {
        "allow_other" => MountOption::AllowOther,
        "allow_root" => MountOption::AllowRoot,
        "auto_unmount" => MountOption::AutoUnmount,
        "default_permissions" => MountOption::DefaultPermissions,
        "ro" => MountOption::RO,
        "rw" => MountOption::RW,
        "exec" => MountOption::Exec,
        "noexec" => MountOption::NoExec,
        "suid" => MountOption::Suid,
        "nosuid" => MountOption::NoSuid,
        "dev" => MountOption::Dev,
        "nodev" => MountOption::NoDev,
        "atime" => MountOption::Atime,
        "noatime" => MountOption::NoAtime,
        "dirsync" => MountOption::DirSync,
        "sync" => MountOption::Sync,
        "async" => MountOption::Async,
        other => MountOption::CUSTOM(other.to_string()),
    }
}

fn main() {
    let mut cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Missing arguments are a usage error: print and exit 1 without
            // touching the mount point.
            eprint!("{}", err);
            process::exit(1);
        }
    };

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    if let Err(e) = run(&mut cli) {
        tracing::error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &mut Cli) -> anyhow::Result<()> {
    use anyhow::Context;

    // Caller-supplied permission bits must reach the backing store unmasked.
    unsafe { libc::umask(0) };

    let context = MountContext::new(&cli.passphrase, &cli.mirror_root, &cli.mount_point)
        .context("invalid mount parameters")?;

    info!("deriving content key...");
    let cipher = PassphraseCipher::derive(context.passphrase(), &KdfParams::default())
        .context("key derivation failed")?;
    cli.passphrase.zeroize();

    let mut options = vec![
        MountOption::FSName("veilfs".to_string()),
        MountOption::AutoUnmount,
    ];
    options.extend(cli.mount_options.iter().map(|o| parse_mount_option(o)));

    info!(
        "mounting {:?} on {:?}",
        context.mirror_root(),
        context.mount_point()
    );

    let mount_point = context.mount_point().to_path_buf();
    let filesystem = VeilFs::new(context, cipher);

    // Blocks until the filesystem is unmounted.
    fuser::mount2(filesystem, &mount_point, &options).context("mount failed")?;

    info!("unmounted {:?}", mount_point);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_arguments_is_a_usage_error() {
        assert!(Cli::try_parse_from(["veilfs"]).is_err());
        assert!(Cli::try_parse_from(["veilfs", "pw"]).is_err());
        assert!(Cli::try_parse_from(["veilfs", "pw", "/mirror"]).is_err());
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["veilfs", "pw", "/mirror", "/mnt"]).unwrap();
        assert_eq!(cli.passphrase, "pw");
        assert_eq!(cli.mirror_root, PathBuf::from("/mirror"));
        assert_eq!(cli.mount_point, PathBuf::from("/mnt"));
        assert!(cli.mount_options.is_empty());
    }

    #[test]
    fn test_trailing_mount_options_collected() {
        let cli =
            Cli::try_parse_from(["veilfs", "pw", "/mirror", "/mnt", "allow_other", "noatime"])
                .unwrap();
        assert_eq!(cli.mount_options, vec!["allow_other", "noatime"]);
    }

    #[test]
    fn test_parse_mount_option_known_and_custom() {
        assert!(matches!(
            parse_mount_option("allow_other"),
            MountOption::AllowOther
        ));
        match parse_mount_option("fsname=weird") {
            MountOption::CUSTOM(s) => assert_eq!(s, "fsname=weird"),
            other => panic!("unexpected option {:?}", other),
        }
    }
}
