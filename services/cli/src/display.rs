//! Plain-text rendering of entities

use rust_decimal::Decimal;
use std::fmt::Write;

use common::money::MoneyFormat;
use connection::models::{AuditInfo, Barcode, Drink, ServerInfo, User};

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

fn id(value: Option<i64>) -> String {
    optional(value)
}

/// Left-aligned columns separated by two spaces
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&render_row(headers.iter().copied(), &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn render_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let padding = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(padding))
        })
        .collect();
    line.join("  ").trim_end().to_string()
}

pub fn users(users: &[User], money: &MoneyFormat) -> String {
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|user| {
            vec![
                id(user.id),
                user.name.clone(),
                optional(user.email.as_deref()),
                money.format(user.balance),
                yes_no(user.active).to_string(),
            ]
        })
        .collect();
    table(&["id", "name", "email", "balance", "active"], &rows)
}

pub fn user(user: &User, money: &MoneyFormat) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", user.name, id(user.id));
    let _ = writeln!(out, "  email:    {}", optional(user.email.as_deref()));
    let _ = writeln!(out, "  balance:  {}", money.format(user.balance));
    let _ = writeln!(out, "  active:   {}", yes_no(user.active));
    let _ = writeln!(out, "  audit:    {}", yes_no(user.audit));
    let _ = writeln!(out, "  redirect: {}", yes_no(user.redirect));
    out
}

pub fn drinks(drinks: &[Drink], money: &MoneyFormat) -> String {
    let rows: Vec<Vec<String>> = drinks
        .iter()
        .map(|drink| {
            vec![
                id(drink.id),
                drink.name.clone(),
                money.format(drink.price),
                optional(drink.bottle_size.map(|size| size.normalize())),
                optional(drink.caffeine),
                yes_no(drink.active).to_string(),
            ]
        })
        .collect();
    table(
        &["id", "name", "price", "bottle size", "caffeine", "active"],
        &rows,
    )
}

pub fn barcodes(barcodes: &[Barcode], drinks: &[Drink]) -> String {
    let rows: Vec<Vec<String>> = barcodes
        .iter()
        .map(|barcode| {
            vec![
                barcode.id.clone(),
                Drink::name_of(drinks, barcode.drink).to_string(),
            ]
        })
        .collect();
    table(&["barcode", "drink"], &rows)
}

pub fn audits(info: &AuditInfo, drinks: &[Drink], money: &MoneyFormat) -> String {
    let rows: Vec<Vec<String>> = info
        .audits
        .iter()
        .map(|audit| {
            vec![
                audit.created_at.clone(),
                Drink::name_of(drinks, audit.drink).to_string(),
                money.format(audit.difference),
            ]
        })
        .collect();

    let mut out = table(&["time", "drink", "amount"], &rows);
    let _ = writeln!(out);
    let _ = writeln!(out, "payments: {}", money.format(info.payments_sum));
    let _ = writeln!(out, "deposits: {}", money.format(info.deposits_sum));
    let _ = writeln!(out, "sum:      {}", money.format(info.sum));
    out
}

pub fn server_info(info: &ServerInfo) -> String {
    let money = info.money_format();
    let limit = info
        .global_credit_limit
        .map_or_else(|| "none".to_string(), |limit: Decimal| money.format(limit));

    let mut out = String::new();
    let _ = writeln!(out, "version:        {}", optional(info.version.as_deref()));
    let _ = writeln!(out, "credit limit:   {}", limit);
    let _ = writeln!(out, "currency:       {}", info.currency);
    let _ = writeln!(out, "energy:         {}", info.energy);
    let _ = writeln!(out, "default price:  {}", money.format(info.defaults.price));
    let _ = writeln!(
        out,
        "default size:   {}",
        optional(info.defaults.package_size.as_deref())
    );
    let _ = writeln!(out, "default active: {}", yes_no(info.defaults.active));
    out
}
