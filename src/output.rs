//! Export of the collected offers.

use anyhow::Result;

use crate::config::{OutputConfig, OutputFormat};
use crate::model::OfferRecord;

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

/// Output results in the requested format
pub fn output_results(records: &[OfferRecord], config: &OutputConfig) -> Result<()> {
    let output_str = match config.format {
        OutputFormat::Json => format_json(records)?,
        OutputFormat::Csv => format_csv(records)?,
        OutputFormat::Text => format_text(records),
    };

    // Write to file or stdout
    if let Some(output_file) = &config.path {
        std::fs::write(output_file, &output_str)?;
        log::info!("💾 Output saved to: {}", output_file.display());
    } else if !config.quiet {
        println!("{}", output_str);
    }

    Ok(())
}

pub fn format_json(records: &[OfferRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// One row per offer; missing values are empty cells.
pub fn format_csv(records: &[OfferRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record([
        "itemUrl",
        "keyword",
        "title",
        "description",
        "identifier",
        "price",
        "sellerName",
    ])?;

    for record in records {
        writer.write_record([
            record.item_url.as_str(),
            record.keyword.as_str(),
            record.title.as_deref().unwrap_or_default(),
            record.description.as_deref().unwrap_or_default(),
            record.identifier.as_deref().unwrap_or_default(),
            record.price.as_deref().unwrap_or_default(),
            record.seller_name.as_deref().unwrap_or_default(),
        ])?;
    }

    Ok(String::from_utf8(writer.into_inner()?)?)
}

pub fn format_text(records: &[OfferRecord]) -> String {
    let mut output = String::new();

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
            output.push_str(&"=".repeat(80));
            output.push_str("\n\n");
        }

        output.push_str(&format!("URL: {}\n", record.item_url));
        output.push_str(&format!("Keyword: {}\n", record.keyword));
        output.push_str(&format!("Title: {}\n", or_missing(&record.title)));
        output.push_str(&format!("Identifier: {}\n", or_missing(&record.identifier)));
        output.push_str(&format!("Price: {}\n", or_missing(&record.price)));
        output.push_str(&format!("Seller: {}\n", or_missing(&record.seller_name)));

        if let Some(description) = &record.description {
            let preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
            if preview.len() < description.len() {
                output.push_str(&format!("Description: {}...\n", preview));
            } else {
                output.push_str(&format!("Description: {}\n", preview));
            }
        }
    }

    output
}

fn or_missing(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(not found)")
}
