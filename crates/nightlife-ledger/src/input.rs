//! Parsing of compact command-line values
//!
//! - bracket: `PCT:FROM[:TO]` (`15:0:40000`, `20:40000` for an open top tier)
//! - partner / promoter / VIP: `NAME:AMOUNT`
//! - staff: `ROLE:NAME:PAYMENT`
//! - ad spend: `PLATFORM:AMOUNT[:REACH[:CLICKS[:LEADS]]]`

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use crate::constants;
use crate::model::{AdSpend, CommissionBracket, Partner, Promoter, Staff, VipGirl};

fn parse_number(field: &str, value: &str) -> Result<f64> {
    let number: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} '{}': expected a number", field, value))?;
    if !number.is_finite() {
        bail!("Invalid {} '{}': must be finite", field, value);
    }
    Ok(number)
}

fn parse_count(field: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} '{}': expected a whole number", field, value))
}

/// Split `NAME:AMOUNT`, allowing colons inside the name
fn split_named_amount<'a>(kind: &str, raw: &'a str) -> Result<(&'a str, &'a str)> {
    let Some((name, amount)) = raw.rsplit_once(':') else {
        bail!("Invalid {} '{}': expected NAME:AMOUNT", kind, raw);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid {} '{}': name is empty", kind, raw);
    }
    Ok((name, amount))
}

/// Parse a YYYY-MM-DD date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), constants::DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}': expected YYYY-MM-DD", value))
}

pub fn parse_bracket(raw: &str) -> Result<CommissionBracket> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (pct, from, to) = match parts.as_slice() {
        [pct, from] => (*pct, *from, None),
        [pct, from, to] if to.trim().is_empty() => (*pct, *from, None),
        [pct, from, to] => (*pct, *from, Some(*to)),
        _ => bail!("Invalid bracket '{}': expected PCT:FROM[:TO]", raw),
    };

    Ok(CommissionBracket {
        percentage: parse_number("bracket percentage", pct)?,
        from_amount: parse_number("bracket start", from)?,
        to_amount: to.map(|to| parse_number("bracket end", to)).transpose()?,
    })
}

pub fn parse_partner(raw: &str) -> Result<Partner> {
    let (name, pct) = split_named_amount("partner", raw)?;
    Ok(Partner {
        name: name.to_string(),
        percentage: parse_number("partner percentage", pct)?,
    })
}

pub fn parse_promoter(raw: &str) -> Result<Promoter> {
    let (name, amount) = split_named_amount("promoter", raw)?;
    Ok(Promoter {
        name: name.to_string(),
        commission: parse_number("promoter commission", amount)?,
    })
}

pub fn parse_vip(raw: &str) -> Result<VipGirl> {
    let (name, amount) = split_named_amount("VIP", raw)?;
    Ok(VipGirl {
        name: name.to_string(),
        commission: parse_number("VIP commission", amount)?,
    })
}

pub fn parse_staff(raw: &str) -> Result<Staff> {
    let [role, name, payment] = raw.splitn(3, ':').collect::<Vec<_>>()[..] else {
        bail!("Invalid staff '{}': expected ROLE:NAME:PAYMENT", raw);
    };
    Ok(Staff {
        role: role.trim().to_string(),
        name: name.trim().to_string(),
        payment: parse_number("staff payment", payment)?,
    })
}

pub fn parse_ad_spend(raw: &str) -> Result<AdSpend> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() < 2 || parts.len() > 5 {
        bail!("Invalid ad spend '{}': expected PLATFORM:AMOUNT[:REACH[:CLICKS[:LEADS]]]", raw);
    }

    let metric = |index: usize, field: &str| -> Result<Option<u64>> {
        match parts.get(index) {
            Some(value) if !value.trim().is_empty() => parse_count(field, value).map(Some),
            _ => Ok(None),
        }
    };

    Ok(AdSpend {
        platform: parts[0].trim().to_string(),
        amount: parse_number("ad spend amount", parts[1])?,
        reach: metric(2, "reach")?,
        clicks: metric(3, "clicks")?,
        leads: metric(4, "leads")?,
    })
}
