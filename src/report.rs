use crate::chain::ChainId;
use crate::deployer::DeployerRecord;
use crate::funding::FundingRecord;
use crate::history::TokenHistoryEntry;
use crate::metadata::TokenMetadata;
use crate::platforms::PlatformMatch;
use alloy_primitives::Address;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;
use std::fmt::Write as _;

/// The assembled provenance report. Every field besides the address and
/// chain is best-effort: an absent value means the corresponding upstream
/// had nothing or failed, never that the analysis as a whole failed.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub address: Address,
    pub chain: ChainId,
    pub metadata: Option<TokenMetadata>,
    pub platforms: Vec<PlatformMatch>,
    pub deployer: Option<DeployerRecord>,
    pub deployer_tokens: Vec<TokenHistoryEntry>,
    pub funding: Option<FundingRecord>,
    pub self_funded: bool,
    pub funder_tokens: Vec<TokenHistoryEntry>,
}

impl AnalysisReport {
    pub fn new(address: Address, chain: ChainId) -> Self {
        AnalysisReport {
            address,
            chain,
            metadata: None,
            platforms: Vec::new(),
            deployer: None,
            deployer_tokens: Vec::new(),
            funding: None,
            self_funded: false,
            funder_tokens: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &str {
        self.metadata
            .as_ref()
            .map_or("UNKNOWN", |m| m.symbol.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

pub fn format_report(report: &AnalysisReport, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_text(report),
        OutputFormat::Json => format_json(report),
        OutputFormat::Csv => format_csv(report),
    }
}

fn format_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "TOKEN ANALYSIS");
    let _ = writeln!(out, "Chain:   {}", report.chain.as_str().to_uppercase());
    let _ = writeln!(out, "Address: {}", report.address);
    let _ = writeln!(out);

    let _ = writeln!(out, "TOKEN INFORMATION");
    match &report.metadata {
        Some(meta) => {
            let _ = writeln!(out, "Name:         {}", meta.name);
            let _ = writeln!(out, "Symbol:       ${}", meta.symbol);
            let _ = writeln!(out, "Decimals:     {}", meta.decimals);
            let _ = writeln!(out, "Total supply: {}", meta.total_supply_formatted());
        }
        None => {
            let _ = writeln!(out, "Token metadata unavailable.");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "DETECTED PLATFORMS");
    if report.platforms.is_empty() {
        let _ = writeln!(out, "No platform match.");
    } else {
        for platform in &report.platforms {
            let _ = writeln!(out, "- {}: {}", platform.name, platform.url);
        }
    }
    let _ = writeln!(out);

    let ticker = report.ticker();
    let _ = writeln!(out, "SOCIAL SEARCH (${ticker})");
    let _ = writeln!(out, "- Twitter: https://twitter.com/search?q=%24{ticker}");
    let _ = writeln!(
        out,
        "- Farcaster: https://warpcast.com/~/search?q=%24{ticker}"
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "DEPLOYER");
    match &report.deployer {
        Some(deployer) => {
            let _ = writeln!(out, "Address:     {}", deployer.deployer);
            let _ = writeln!(
                out,
                "Creation tx: {}",
                deployer.creation_tx.as_deref().unwrap_or("unknown")
            );
            let _ = writeln!(out, "Tokens created by this deployer:");
            let _ = writeln!(out, "{}", history_section(&report.deployer_tokens));
            let _ = writeln!(out);

            let _ = writeln!(out, "FUNDING WALLET");
            if report.self_funded {
                let _ = writeln!(out, "The deployer funded itself.");
            } else {
                match &report.funding {
                    Some(funding) => {
                        let _ = writeln!(out, "Address: {}", funding.funder);
                        let _ = writeln!(out, "Tokens created by the funding wallet:");
                        let _ = writeln!(out, "{}", history_section(&report.funder_tokens));
                    }
                    None => {
                        let _ = writeln!(out, "Funding wallet not found.");
                    }
                }
            }
        }
        None => {
            let _ = writeln!(out, "Deployer information unavailable.");
        }
    }

    out
}

fn history_section(entries: &[TokenHistoryEntry]) -> String {
    if entries.is_empty() {
        return "No other tokens found or data unavailable.".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Name", "Symbol", "Address", "Created"]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(format!("${}", entry.symbol)),
            Cell::new(entry.address),
            Cell::new(entry.created_at.format("%Y-%m-%d %H:%M:%S")),
        ]);
    }

    table.to_string()
}

fn format_json(report: &AnalysisReport) -> String {
    let history_json = |entries: &[TokenHistoryEntry]| {
        entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name,
                    "symbol": e.symbol,
                    "address": format!("{}", e.address),
                    "created_at": e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                })
            })
            .collect::<Vec<_>>()
    };

    let value = json!({
        "address": format!("{}", report.address),
        "chain": report.chain.as_str(),
        "metadata": report.metadata.as_ref().map(|m| json!({
            "name": m.name,
            "symbol": m.symbol,
            "decimals": m.decimals,
            "total_supply": m.total_supply.to_string(),
            "total_supply_formatted": m.total_supply_formatted(),
        })),
        "platforms": report.platforms.iter().map(|p| json!({
            "name": p.name,
            "url": p.url,
        })).collect::<Vec<_>>(),
        "deployer": report.deployer.as_ref().map(|d| json!({
            "address": format!("{}", d.deployer),
            "creation_tx": d.creation_tx,
        })),
        "deployer_tokens": history_json(&report.deployer_tokens),
        "funding_wallet": report.funding.as_ref().map(|f| format!("{}", f.funder)),
        "self_funded": report.self_funded,
        "funder_tokens": history_json(&report.funder_tokens),
    });

    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

fn format_csv(report: &AnalysisReport) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record(["section", "name", "symbol", "address", "created_at"]);

    let mut write_entries = |section: &str, entries: &[TokenHistoryEntry]| {
        for entry in entries {
            let _ = wtr.write_record([
                section,
                &entry.name,
                &entry.symbol,
                &format!("{}", entry.address),
                &entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]);
        }
    };

    write_entries("deployer", &report.deployer_tokens);
    write_entries("funding_wallet", &report.funder_tokens);

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use chrono::DateTime;
    use std::str::FromStr;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn sample_report() -> AnalysisReport {
        let mut report = AnalysisReport::new(addr(0x10), ChainId::Base);
        report.metadata = Some(TokenMetadata {
            address: addr(0x10),
            chain: ChainId::Base,
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            decimals: 18,
            total_supply: U256::from_str("1000000000000000000000").unwrap(),
        });
        report.platforms = vec![PlatformMatch {
            name: "clanker".to_string(),
            url: "https://www.clanker.world/clanker/0x10".to_string(),
        }];
        report.deployer = Some(DeployerRecord {
            deployer: addr(0xDD),
            creation_tx: Some("0xcafe".to_string()),
        });
        report.deployer_tokens = vec![TokenHistoryEntry {
            name: "First".to_string(),
            symbol: "ONE".to_string(),
            address: addr(0x11),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }];
        report
    }

    #[test]
    fn text_report_renders_all_sections() {
        let text = format_text(&sample_report());
        assert!(text.contains("Chain:   BASE"));
        assert!(text.contains("Symbol:       $TST"));
        assert!(text.contains("Total supply: 1,000"));
        assert!(text.contains("clanker"));
        assert!(text.contains("SOCIAL SEARCH ($TST)"));
        assert!(text.contains("Tokens created by this deployer:"));
        assert!(text.contains("$ONE"));
        assert!(text.contains("Funding wallet not found."));
    }

    #[test]
    fn text_report_degrades_gracefully() {
        let report = AnalysisReport::new(addr(0x10), ChainId::Optimism);
        let text = format_text(&report);
        assert!(text.contains("Token metadata unavailable."));
        assert!(text.contains("No platform match."));
        assert!(text.contains("SOCIAL SEARCH ($UNKNOWN)"));
        assert!(text.contains("Deployer information unavailable."));
        assert!(!text.contains("FUNDING WALLET"));
    }

    #[test]
    fn self_funded_wallets_are_reported_distinctly() {
        let mut report = sample_report();
        report.self_funded = true;
        let text = format_text(&report);
        assert!(text.contains("The deployer funded itself."));
    }

    #[test]
    fn json_report_round_trips_key_fields() {
        let rendered = format_json(&sample_report());
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["chain"], "base");
        assert_eq!(value["metadata"]["total_supply_formatted"], "1,000");
        assert_eq!(value["deployer"]["creation_tx"], "0xcafe");
        assert_eq!(value["self_funded"], false);
        assert_eq!(value["funding_wallet"], serde_json::Value::Null);
        assert_eq!(value["deployer_tokens"][0]["symbol"], "ONE");
    }

    #[test]
    fn csv_report_lists_history_entries() {
        let rendered = format_csv(&sample_report());
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next().unwrap(),
            "section,name,symbol,address,created_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("deployer,First,ONE,"));
        assert!(row.ends_with("2023-11-14 22:13:20"));
    }

    #[test]
    fn output_format_parses_like_a_cli_flag() {
        assert!(matches!(OutputFormat::from("json"), OutputFormat::Json));
        assert!(matches!(OutputFormat::from("CSV"), OutputFormat::Csv));
        assert!(matches!(OutputFormat::from("anything"), OutputFormat::Text));
    }
}
