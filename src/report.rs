use crate::pipeline::{EnvironmentRun, ImageStatus, RunReport};
use crate::results::WordFrequencyTable;
use std::fmt::Write;

/// Render one environment's run as a printable block
pub fn render_run(run: &EnvironmentRun) -> String {
    match &run.outcome {
        Ok(report) => render_report(report),
        Err(e) => {
            let mut out = header(&run.label);
            let _ = writeln!(out, "Run failed: {}", e);
            out
        }
    }
}

/// Per-article listing followed by the repeated-words table
pub fn render_report(report: &RunReport) -> String {
    let mut out = header(&report.environment);

    for (index, article) in report.articles.iter().enumerate() {
        let record = &article.record;
        let _ = writeln!(out, "Article {}:", index + 1);
        let _ = writeln!(out, "Title: {}", record.title);
        let _ = writeln!(out, "Content: {}", or_none(record.content.as_deref()));
        let _ = writeln!(out, "Link: {}", record.link);
        let _ = writeln!(out, "Image URL: {}", or_none(record.image_url.as_deref()));
        match &article.image {
            ImageStatus::Saved(path) => {
                let _ = writeln!(out, "Image saved: {}", path.display());
            }
            ImageStatus::Failed(_) => {
                let _ = writeln!(out, "Failed to download image");
            }
            ImageStatus::Missing | ImageStatus::Disabled => {}
        }

        let _ = writeln!(out);
        match &article.translation {
            Some(pair) => {
                let _ = writeln!(out, "Translated English version:");
                let _ = writeln!(out, "Title: {}", pair.title_en);
                let _ = writeln!(out, "Content: {}", pair.content_en);
            }
            None => {
                let _ = writeln!(out, "Translation unavailable");
            }
        }
        let _ = writeln!(out);
    }

    out.push_str(&render_frequencies(&report.frequencies));
    out
}

/// The repeated-words table, or `None` when nothing crossed the threshold
pub fn render_frequencies(table: &WordFrequencyTable) -> String {
    let mut out = String::from("Repeated Words With Count\n");
    if table.is_empty() {
        out.push_str("None\n");
    } else {
        for (word, count) in table.iter() {
            let _ = writeln!(out, "Word: {:<10} | Count: {:>10}", word, count);
        }
    }
    out
}

fn header(label: &str) -> String {
    format!("===== {} =====\n", label)
}

fn or_none(value: Option<&str>) -> &str {
    value.unwrap_or("None")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::aggregate;
    use crate::pipeline::ProcessedArticle;
    use crate::results::{ArticleRecord, TranslatedPair};
    use std::path::PathBuf;

    #[test]
    fn test_empty_frequencies() {
        let table = WordFrequencyTable::default();
        assert_eq!(render_frequencies(&table), "Repeated Words With Count\nNone\n");
    }

    #[test]
    fn test_frequency_rows() {
        let table = aggregate(&["la la la"], 2);
        assert_eq!(
            render_frequencies(&table),
            "Repeated Words With Count\nWord: la         | Count:          3\n"
        );
    }

    #[test]
    fn test_report_lists_articles() {
        let report = RunReport {
            environment: "local".to_string(),
            articles: vec![
                ProcessedArticle {
                    record: ArticleRecord::new(
                        "El título".to_string(),
                        "https://elpais.com/a".to_string(),
                        None,
                        Some("https://img/x.jpg".to_string()),
                    ),
                    translation: Some(TranslatedPair {
                        title_en: "The title".to_string(),
                        content_en: String::new(),
                    }),
                    image: ImageStatus::Saved(PathBuf::from("cover_image/x.jpg")),
                },
                ProcessedArticle {
                    record: ArticleRecord::new(
                        "Otro".to_string(),
                        "https://elpais.com/b".to_string(),
                        Some("Texto".to_string()),
                        None,
                    ),
                    translation: None,
                    image: ImageStatus::Missing,
                },
            ],
            translated_titles: vec!["The title".to_string()],
            frequencies: WordFrequencyTable::default(),
        };

        let text = render_report(&report);
        assert!(text.starts_with("===== local =====\n"));
        assert!(text.contains("Article 1:\nTitle: El título\nContent: None\n"));
        assert!(text.contains("Image saved: cover_image/x.jpg"));
        assert!(text.contains("Translated English version:\nTitle: The title\n"));
        assert!(text.contains("Article 2:"));
        assert!(text.contains("Image URL: None"));
        assert!(text.contains("Translation unavailable"));
        assert!(text.ends_with("None\n"));
    }
}
