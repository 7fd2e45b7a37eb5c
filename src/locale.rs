//! Document labels in each supported language.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Tr,
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Tr => write!(f, "tr"),
        }
    }
}

/// Every piece of fixed text that ends up in the document.
#[derive(Debug)]
pub struct Labels {
    pub title: &'static str,
    pub table_of_contents: &'static str,
    pub history: &'static str,
    pub source: &'static str,
    pub generated: &'static str,
    pub size: &'static str,
    pub last_modified: &'static str,
    pub last_commit: &'static str,
    pub author: &'static str,
    pub commit: &'static str,
    pub date: &'static str,
    pub message: &'static str,
}

const EN: Labels = Labels {
    title: "Code Documentation",
    table_of_contents: "Table of Contents",
    history: "Git Commit History",
    source: "Source",
    generated: "Generated Date",
    size: "Size",
    last_modified: "Last Modified",
    last_commit: "Last Commit",
    author: "Author",
    commit: "Commit",
    date: "Date",
    message: "Message",
};

const TR: Labels = Labels {
    title: "Kod Dokümantasyonu",
    table_of_contents: "İçindekiler",
    history: "Git Commit Geçmişi",
    source: "Kaynak",
    generated: "Oluşturulma Tarihi",
    size: "Boyut",
    last_modified: "Son Değişiklik",
    last_commit: "Son Commit",
    author: "Yazar",
    commit: "Commit",
    date: "Tarih",
    message: "Mesaj",
};

impl Locale {
    pub fn labels(&self) -> &'static Labels {
        match self {
            Locale::En => &EN,
            Locale::Tr => &TR,
        }
    }

    /// Format a timestamp the way readers of this locale expect.
    pub fn format_date<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        match self {
            Locale::En => date.format("%m/%d/%Y, %I:%M:%S %p").to_string(),
            Locale::Tr => date.format("%d.%m.%Y %H:%M:%S").to_string(),
        }
    }
}
