use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use futures::Stream;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;

use graph_feed::digest::{
    parse_month_name, render_digest, select_for_digest, DigestConfig, DigestFilter,
};
use graph_feed::entity::NormalizedEntity;
use graph_feed::export::{export_feed, ExportSummary};
use graph_feed::environment::{mask_token, Config};
use graph_feed::graph::{
    facebook_feed, instagram_account_for_page, instagram_feed, GraphClient, ReqwestTransport,
};
use graph_feed::rss::{ChannelInfo, RssFeedWriter};
use graph_feed::store::{read_entities, NdjsonWriter};

const INSTAGRAM_CHANNEL_TITLE: &str = "Farerskie Kadry na Instagramie";
const INSTAGRAM_CHANNEL_LINK: &str = "https://www.instagram.com/farerskie.kadry/";
const CHANNEL_DESCRIPTION: &str = "Suma miliona drobnych, banalnych sytuacji, miejsc, \
    ludzi uwiecznionych na cyfrowych kadrach i w nostalgicznych zakamarkach pamięci";

#[derive(Parser)]
#[command(name = "graph-feed", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the posts of a Facebook page
    Facebook {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Fetch the media of the Instagram account connected to a page
    Instagram {
        /// Instagram account id (looked up from the page when omitted)
        #[arg(short, long)]
        account: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Render the HTML digest of a hashtag campaign from an NDJSON dump
    Digest {
        /// NDJSON file written by the facebook or instagram command
        #[arg(short, long)]
        input: PathBuf,

        /// HTML file to write
        #[arg(short, long)]
        output: PathBuf,

        /// First day of the campaign (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the campaign (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Hashtag marking the campaign, without the leading #
        #[arg(short, long)]
        marker: String,

        /// Re-hosted picture URL, {n} is replaced by the entry position
        #[arg(long)]
        image_template: Option<String>,

        /// Pattern of the day header opening each entry
        #[arg(long)]
        day_header: Option<String>,

        /// Month name used in dates, as NUMBER=NAME (repeatable)
        #[arg(long = "month", value_parser = parse_month_name)]
        months: Vec<(u32, String)>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Facebook page name (FB_PAGE)
    #[arg(short, long)]
    page: Option<String>,

    /// RSS file to write
    #[arg(long)]
    rss: Option<PathBuf>,

    /// NDJSON file to append the records to
    #[arg(long)]
    ndjson: Option<PathBuf>,

    /// Number of entries in the RSS feed (FEED_ITEMS_LIMIT)
    #[arg(short, long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    graph_feed::logging::configure_logging();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command {
        Commands::Facebook { output } => {
            apply_overrides(&mut config, &output);
            let token = config.token()?;
            info!("Using Facebook token: {}", mask_token(token));

            let client = graph_client(&config)?;
            let channel = ChannelInfo {
                title: format!("{} na Facebooku", config.page),
                link: format!("https://www.facebook.com/{}", config.page),
                description: Some(CHANNEL_DESCRIPTION.to_string()),
            };

            let summary = export_to_files(
                facebook_feed(&client, &config.page, token),
                &output,
                config.feed_items_limit,
                channel,
            )
            .await?;
            print_summary("Facebook", &config.page, &summary);
        }

        Commands::Instagram { account, output } => {
            apply_overrides(&mut config, &output);
            let token = config.token()?;
            info!("Using Facebook token: {}", mask_token(token));

            let client = graph_client(&config)?;
            let account = match account.or_else(|| config.instagram_account.clone()) {
                Some(account) => account,
                None => instagram_account_for_page(&client, &config.page, token)
                    .await?
                    .ok_or_else(|| {
                        anyhow!("No Instagram account connected to the \"{}\" page", config.page)
                    })?,
            };

            let channel = ChannelInfo {
                title: INSTAGRAM_CHANNEL_TITLE.to_string(),
                link: INSTAGRAM_CHANNEL_LINK.to_string(),
                description: Some(CHANNEL_DESCRIPTION.to_string()),
            };

            let summary = export_to_files(
                instagram_feed(&client, &account, token),
                &output,
                config.feed_items_limit,
                channel,
            )
            .await?;
            print_summary("Instagram", &account, &summary);
        }

        Commands::Digest {
            input,
            output,
            from,
            to,
            marker,
            image_template,
            day_header,
            months,
        } => {
            let file = File::open(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            let entities = read_entities(BufReader::new(file))?;

            let filter = DigestFilter {
                from,
                to,
                marker: marker.trim_start_matches('#').to_string(),
            };
            let mut digest_config = DigestConfig::default();
            if let Some(template) = &image_template {
                digest_config = digest_config.with_image_template(template);
            }
            if let Some(pattern) = &day_header {
                digest_config = digest_config
                    .with_day_header(pattern)
                    .with_context(|| format!("Invalid day header pattern {:?}", pattern))?;
            }
            for (month, name) in &months {
                digest_config = digest_config.with_month_name(*month, name);
            }

            let selected = select_for_digest(entities, &filter);
            let html = render_digest(&selected, &filter.marker, &digest_config);
            std::fs::write(&output, html)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!(
                "{}: {} entries -> {}",
                "Digest".bright_blue(),
                selected.len().to_string().green(),
                output.display()
            );
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, output: &OutputArgs) {
    if let Some(page) = &output.page {
        config.page = page.clone();
    }
    if let Some(limit) = output.limit {
        config.feed_items_limit = limit;
    }
}

fn graph_client(config: &Config) -> Result<GraphClient<ReqwestTransport>> {
    let transport = ReqwestTransport::new().context("Failed to create the HTTP client")?;
    Ok(GraphClient::with_base_url(transport, &config.api_url))
}

fn append_file(path: &Path) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn create_file(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Opens the requested outputs and drains the feed into them.
async fn export_to_files<S>(
    feed: S,
    output: &OutputArgs,
    limit: usize,
    channel: ChannelInfo,
) -> Result<ExportSummary>
where
    S: Stream<Item = graph_feed::Result<NormalizedEntity>>,
{
    let mut store = match &output.ndjson {
        Some(path) => Some(NdjsonWriter::new(append_file(path)?)),
        None => None,
    };
    let mut rss = match &output.rss {
        Some(path) => Some(RssFeedWriter::new(create_file(path)?, channel)),
        None => None,
    };

    let summary = export_feed(feed, rss.as_mut(), store.as_mut(), limit).await?;

    if let Some(store) = store {
        store.finish()?;
    }

    Ok(summary)
}

fn print_summary(source: &str, name: &str, summary: &ExportSummary) {
    println!(
        "{} {}: fetched {}, RSS items {}, stored {}",
        source.bright_blue(),
        name.bold(),
        summary.fetched.to_string().green(),
        summary.rss_items,
        summary.stored
    );
}
