//! Results pasted by an administrator, one finisher per line.

use std::collections::HashMap;

use entity::prelude::*;
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use sea_orm::entity::prelude::*;
use sea_orm::TransactionTrait;

use crate::dto::live_golf::{parse_money, parse_position};
use crate::dto::{ImportReport, ResultInput};
use crate::error::{db_error, GenericError};
use crate::normalize::normalize_person;

lazy_static! {
    static ref SPACED_LINE: Regex = Regex::new(
        r"(?i)^(?:[PT])?(?P<pos>\d+)\s+(?P<name>.+?)\s+\$?(?P<purse>[\d,]+(?:\.\d{2})?)\s*$"
    )
    .expect("valid results line pattern");
}

/// Positions above this in a CSV line are read as money.
const MAX_FIELD_SIZE: i32 = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardRow {
    pub name: String,
    pub position: Option<i32>,
    pub purse: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardParse {
    pub rows: Vec<ClipboardRow>,
    /// One-based line number and the offending text.
    pub errors: Vec<(usize, String)>,
}

fn position_token(token: &str) -> Option<i32> {
    let token = token.trim();
    let token = token
        .strip_prefix(|c| c == 'P' || c == 'p')
        .unwrap_or(token);
    parse_position(token)
}

fn spaced(text: &str) -> Option<ClipboardRow> {
    let caps = SPACED_LINE.captures(text)?;
    Some(ClipboardRow {
        name: caps["name"].trim().to_string(),
        position: caps["pos"].parse().ok(),
        purse: parse_money(&caps["purse"])?,
    })
}

/// `pos<TAB>name<TAB>$purse`, extra columns ignored.
fn tabbed(text: &str) -> Option<ClipboardRow> {
    let parts: Vec<&str> = text
        .split('\t')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    let position = position_token(parts[0])?;
    let purse = parts[2..].iter().find(|p| p.contains('$'))?;
    Some(ClipboardRow {
        name: parts[1].to_string(),
        position: Some(position),
        purse: parse_money(purse)?,
    })
}

/// `name, pos, purse` in either order of the last two.
fn comma_separated(text: &str) -> Option<ClipboardRow> {
    let parts: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }
    let mut position = None;
    let mut purse = None;
    for part in &parts[1..] {
        if part.contains('$') {
            purse = parse_money(part);
        } else if let Some(p) = position_token(part).filter(|p| position.is_none() && *p <= MAX_FIELD_SIZE) {
            position = Some(p);
        } else {
            purse = parse_money(part);
        }
    }
    Some(ClipboardRow {
        name: parts[0].to_string(),
        position: Some(position?),
        purse: purse?,
    })
}

pub fn parse_clipboard(raw: &str) -> ClipboardParse {
    let mut parsed = ClipboardParse::default();
    for (index, line) in raw.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let row = if text.contains('\t') {
            tabbed(text).or_else(|| spaced(text))
        } else {
            spaced(text).or_else(|| text.contains(',').then(|| comma_separated(text)).flatten())
        };
        match row {
            Some(row) => parsed.rows.push(row),
            None => parsed.errors.push((index + 1, text.to_string())),
        }
    }
    parsed
}

/// Upserts every parsed line whose golfer is known. Unknown names and unreadable lines are
/// reported back, never fatal.
pub async fn import_clipboard<C>(
    db: &C,
    tournament_id: i32,
    raw: &str,
) -> Result<ImportReport, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    Tournament::find_by_id(tournament_id)
        .one(db)
        .await
        .map_err(db_error("Unable to load tournament"))?
        .ok_or(GenericError::NotFound("Tournament not found"))?;

    let parsed = parse_clipboard(raw);
    let golfers: HashMap<String, i32> = Golfer::find()
        .all(db)
        .await
        .map_err(db_error("Unable to load golfers"))?
        .into_iter()
        .map(|g| (normalize_person(&g.name), g.id))
        .collect();

    let mut report = ImportReport {
        unparsed_lines: parsed.errors.iter().map(|(line, _)| *line).collect(),
        ..Default::default()
    };
    let txn = db
        .begin()
        .await
        .map_err(db_error("Unable to begin txn"))?;
    for row in parsed.rows {
        let Some(&golfer_id) = golfers.get(&normalize_person(&row.name)) else {
            warn!("Clipboard golfer {} is not on the roster", row.name);
            report.unknown_golfers.push(row.name);
            continue;
        };
        ResultInput {
            tournament_id,
            golfer_id,
            purse: row.purse,
            position: row.position,
        }
        .upsert(&txn)
        .await?;
        report.imported += 1;
    }
    txn.commit()
        .await
        .map_err(db_error("Unable to commit txn"))?;

    info!(
        "Clipboard import into {}: {} imported, {} unknown, {} unparsed",
        tournament_id,
        report.imported,
        report.unknown_golfers.len(),
        report.unparsed_lines.len()
    );
    Ok(report)
}
