use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Deserialize;

use fileboost::helpers::{self, ResponsiveSize};
use fileboost::logging;
use fileboost::url::params;
use fileboost::{
    Asset, Attachment, BlobRef, FileboostConfig, Operation, ParamValue, ResizeOptions, UrlBuilder,
    UrlOptions, VariantRef,
};

#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Args {
    /// TOML config; secrets missing from it are read from the environment.
    #[arg(long)]
    config_file: Option<String>,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, action)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct AssetArgs {
    #[arg(long)]
    signed_id: String,

    #[arg(long)]
    filename: String,

    /// Address the blob through the named attachment.
    #[arg(long)]
    attachment: Option<String>,

    /// Variant pipeline step, e.g. `resize_to_limit=[100, 100]`.
    #[arg(long = "op")]
    operations: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a signed URL.
    Url {
        #[command(flatten)]
        asset: AssetArgs,

        /// Resize option, e.g. `w=300` or `format=webp`.
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },
    /// Print one signed URL per size as `suffix url`.
    Responsive {
        #[command(flatten)]
        asset: AssetArgs,

        /// Size entry, e.g. `sm:w=400` or `lg:w=1200,q=90`.
        #[arg(long = "size", required = true)]
        sizes: Vec<String>,

        /// Base resize option shared by every size.
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },
    /// Check a signature against an asset path and its parameters.
    Verify {
        #[arg(long)]
        path: String,

        #[arg(long)]
        sig: String,

        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(&args.log_level, args.json)?;

    let config = match &args.config_file {
        Some(path) => FileboostConfig::from_file(path)?,
        None => FileboostConfig::from_env(),
    };
    let builder = UrlBuilder::new(config);

    match args.command {
        Command::Url { asset, params } => {
            let asset = asset_from_args(&asset)?;
            let options = UrlOptions::with_resize(resize_options(&params)?);
            match builder.url_for(&asset, &options)? {
                Some(url) => println!("{url}"),
                None => anyhow::bail!("No URL was built; see the log for details."),
            }
        }
        Command::Responsive {
            asset,
            sizes,
            params,
        } => {
            let asset = asset_from_args(&asset)?;
            let sizes = sizes
                .iter()
                .map(|size| responsive_size(size))
                .collect::<Result<Vec<_>>>()?;
            let base = UrlOptions::with_resize(resize_options(&params)?);
            let urls = helpers::responsive_urls(&builder, &asset, &sizes, &base)?;
            for size in &sizes {
                if let Some(url) = urls.get(&size.suffix) {
                    println!("{} {url}", size.suffix);
                }
            }
        }
        Command::Verify { path, sig, params } => {
            builder.config().validate()?;
            let params = params::normalize(&resize_options(&params)?);
            let verified =
                builder
                    .signer()
                    .verify(&builder.config().project_id, &path, &params, &sig);
            anyhow::ensure!(verified, "Signature did not match.");
            println!("valid");
        }
    }

    Ok(())
}

fn asset_from_args(args: &AssetArgs) -> Result<Asset> {
    let blob = BlobRef::new(&args.signed_id, &args.filename);
    if !args.operations.is_empty() {
        let operations = args
            .operations
            .iter()
            .map(|raw| {
                let (name, payload) = name_value(raw)?;
                Ok(Operation::parse(&name, payload))
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(VariantRef::new(blob, operations).into());
    }
    Ok(match &args.attachment {
        Some(name) => Attachment::new(name, Some(blob)).into(),
        None => blob.into(),
    })
}

fn resize_options(raw: &[String]) -> Result<ResizeOptions> {
    raw.iter().map(|pair| name_value(pair)).collect()
}

fn responsive_size(raw: &str) -> Result<ResponsiveSize> {
    let (suffix, options) = raw
        .split_once(':')
        .with_context(|| format!("Expected suffix:options, got \"{raw}\""))?;
    let resize = options
        .split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(name_value)
        .collect::<Result<ResizeOptions>>()?;
    Ok(ResponsiveSize::new(suffix.trim(), resize))
}

#[derive(Deserialize)]
struct TomlValue {
    value: ParamValue,
}

// Values are read as TOML so lists and numbers keep their type; anything that
// isn't valid TOML is taken as a bare string.
fn name_value(raw: &str) -> Result<(String, ParamValue)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected name=value, got \"{raw}\""))?;
    let value = value.trim();
    let parsed = toml::from_str::<TomlValue>(&format!("value = {value}"))
        .map(|wrapped| wrapped.value)
        .unwrap_or_else(|_| ParamValue::from(value));
    Ok((name.trim().to_string(), parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileboost::ParamKey;

    #[test]
    fn name_value_keeps_toml_types() -> Result<()> {
        assert_eq!(name_value("w=300")?, ("w".to_string(), ParamValue::Int(300)));
        assert_eq!(
            name_value("format=webp")?,
            ("format".to_string(), ParamValue::from("webp"))
        );
        assert_eq!(
            name_value("resize_to_limit=[100, 100]")?,
            ("resize_to_limit".to_string(), ParamValue::from(vec![100, 100]))
        );
        assert!(name_value("no-separator").is_err());
        Ok(())
    }

    #[test]
    fn responsive_size_parses_options() -> Result<()> {
        let size = responsive_size("lg:w=1200,q=90")?;
        let params = params::normalize(&size.resize);

        assert_eq!(size.suffix, "lg");
        assert_eq!(params.get(ParamKey::Width), Some("1200"));
        assert_eq!(params.get(ParamKey::Quality), Some("90"));
        Ok(())
    }

    #[test]
    fn operations_make_a_variant() -> Result<()> {
        let args = AssetArgs {
            signed_id: "abc123".to_string(),
            filename: "test.jpg".to_string(),
            attachment: None,
            operations: vec!["resize_to_fill=[300, 200]".to_string(), "format=jpeg".to_string()],
        };
        let Asset::Variant(variant) = asset_from_args(&args)? else {
            anyhow::bail!("expected a variant");
        };
        assert_eq!(variant.operations.len(), 2);
        Ok(())
    }
}
