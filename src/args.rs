use clap::Parser;
use opinion_digest::Digest;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "opinion-digest")]
#[command(about = "Scrape, translate and summarise the opinion section's latest articles")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum number of articles to extract
    #[arg(short = 'n', long)]
    pub max_articles: Option<usize>,

    /// Directory for downloaded cover images
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Local WebDriver URL (overrides WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Report words appearing more than this many times
    #[arg(short, long)]
    pub threshold: Option<usize>,

    /// Run local Chrome headless
    #[arg(long)]
    pub headless: bool,

    /// Ignore the grid section and use the local WebDriver
    #[arg(long)]
    pub local: bool,
}

impl Args {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply(&self, mut digest: Digest) -> Digest {
        if let Some(n) = self.max_articles {
            digest = digest.with_max_articles(n);
        }
        if let Some(dir) = &self.output_dir {
            digest = digest.with_output_dir(dir.clone());
        }
        if let Some(url) = &self.webdriver_url {
            digest = digest.with_webdriver_url(url.clone());
        }
        if let Some(threshold) = self.threshold {
            digest = digest.with_threshold(threshold);
        }
        if self.headless {
            digest = digest.with_headless(true);
        }
        if self.local {
            digest = digest.local_only();
        }
        digest
    }
}
