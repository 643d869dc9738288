//! Classify command - explain how individual paths are treated

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use routemap_core::{Config, Header, SitePath};
use routemap_generator::{
    EmbedPolicy, ExclusionFilter, MetadataEngine, Rewrite, RoutePolicy, classify::Classification,
    is_crawl_allowed,
};

/// Everything the generator decides about one path.
#[derive(Debug)]
struct Report {
    input: SitePath,
    rewrite: Rewrite,
    excluded_by: Option<String>,
    classification: Classification,
    crawl: Vec<(String, bool)>,
    embed: EmbedPolicy,
    headers: Vec<Header>,
}

fn describe(config: &Config, input: SitePath) -> Result<Report> {
    let policy = RoutePolicy::new(config);
    let filter = ExclusionFilter::new(config.sitemap.exclude.clone());
    let engine = MetadataEngine::from_config(&config.sitemap);

    let rewrite = policy.rewrite(&input)?;
    let path = &rewrite.path;

    let crawl = config
        .robots
        .policies
        .iter()
        .map(|p| {
            let agent = p.user_agent.clone();
            let allowed = is_crawl_allowed(&config.robots.policies, &agent, path.as_str());
            (agent, allowed)
        })
        .collect();

    Ok(Report {
        excluded_by: filter.matching_pattern(path).map(ToString::to_string),
        classification: engine.classify(path),
        embed: policy.embed_policy(path),
        headers: policy.headers_for(path),
        crawl,
        input,
        rewrite,
    })
}

fn print_report(report: &Report) {
    println!("{}", report.input);

    if report.rewrite.redirected {
        let kind = if report.rewrite.permanent {
            "permanent"
        } else {
            "temporary"
        };
        println!("  Redirect:   {} ({kind})", report.rewrite.path);
    }

    match &report.excluded_by {
        Some(pattern) => println!("  Sitemap:    excluded by {pattern}"),
        None => {
            let Classification { class, bucket } = report.classification;
            println!(
                "  Sitemap:    priority {:.1}, {} ({class})",
                bucket.priority, bucket.changefreq
            );
        }
    }

    for (agent, allowed) in &report.crawl {
        let verdict = if *allowed { "allowed" } else { "disallowed" };
        println!("  Crawl:      {verdict} for {agent}");
    }

    let embed = match report.embed {
        EmbedPolicy::AllowEmbed => "allowed",
        EmbedPolicy::DenyEmbed => "denied",
    };
    println!("  Embedding:  {embed}");

    for header in &report.headers {
        println!("  Header:     {}: {}", header.key, header.value);
    }
    println!();
}

/// Run the classify command.
pub fn run(config_path: &Path, paths: &[String]) -> Result<()> {
    tracing::info!(?config_path, count = paths.len(), "Classifying paths");

    let config = super::load_config(config_path)?;
    let mut invalid = 0;

    for raw in paths {
        match SitePath::parse(raw.as_str()) {
            Ok(path) => print_report(&describe(&config, path)?),
            Err(e) => {
                println!("{raw}\n  ✗ {e}\n");
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} path(s) could not be classified");
    }

    Ok(())
}
