//! Static Rider-Waite catalog: 22 major arcana plus 4 suits of 14 ranks.
//!
//! Remote names follow the archive's `major_arcana_<key>.png` and
//! `minor_arcana_<suit>_<rank>.png` scheme. Local names follow the app's
//! `NN-<slug>.png` and `<rank>-of-<suit>.png` scheme.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// (archive key, numbered local slug) for every major arcana card, in order
pub const MAJOR_ARCANA: [(&str, &str); 22] = [
    ("fool", "00-the-fool"),
    ("magician", "01-the-magician"),
    ("priestess", "02-the-high-priestess"),
    ("empress", "03-the-empress"),
    ("emperor", "04-the-emperor"),
    ("hierophant", "05-the-hierophant"),
    ("lovers", "06-the-lovers"),
    ("chariot", "07-the-chariot"),
    ("strength", "08-strength"),
    ("hermit", "09-the-hermit"),
    ("fortune", "10-wheel-of-fortune"),
    ("justice", "11-justice"),
    ("hanged", "12-the-hanged-man"),
    ("death", "13-death"),
    ("temperance", "14-temperance"),
    ("devil", "15-the-devil"),
    ("tower", "16-the-tower"),
    ("star", "17-the-star"),
    ("moon", "18-the-moon"),
    ("sun", "19-the-sun"),
    ("judgement", "20-judgement"),
    ("world", "21-the-world"),
];

/// Minor arcana suits, in download order
pub const SUITS: [Suit; 4] = [Suit::Cups, Suit::Pentacles, Suit::Swords, Suit::Wands];

/// Minor arcana ranks, in download order
pub const RANKS: [&str; 14] = [
    "ace", "2", "3", "4", "5", "6", "7", "8", "9", "10", "page", "knight", "queen", "king",
];

const MAJOR_DIR: &str = "major_arcana";
const MINOR_DIR: &str = "minor_arcana";
const IMAGE_EXT: &str = "png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Cups,
    Pentacles,
    Swords,
    Wands,
}

impl Suit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suit::Cups => "cups",
            Suit::Pentacles => "pentacles",
            Suit::Swords => "swords",
            Suit::Wands => "wands",
        }
    }

    /// Capitalized name for section headers
    pub fn title(&self) -> &'static str {
        match self {
            Suit::Cups => "Cups",
            Suit::Pentacles => "Pentacles",
            Suit::Swords => "Swords",
            Suit::Wands => "Wands",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the deck an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "arcana", content = "suit", rename_all = "lowercase")]
pub enum CardGroup {
    Major,
    Minor(Suit),
}

/// One downloadable card image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// File name on the remote archive
    pub remote_name: String,

    /// File name written locally
    pub output_name: String,

    pub group: CardGroup,
}

impl CatalogEntry {
    fn major(key: &str, slug: &str) -> Self {
        Self {
            remote_name: format!("major_arcana_{}.{}", key, IMAGE_EXT),
            output_name: format!("{}.{}", slug, IMAGE_EXT),
            group: CardGroup::Major,
        }
    }

    fn minor(suit: Suit, rank: &str) -> Self {
        Self {
            remote_name: format!("minor_arcana_{}_{}.{}", suit, rank, IMAGE_EXT),
            output_name: format!("{}-of-{}.{}", rank, suit, IMAGE_EXT),
            group: CardGroup::Minor(suit),
        }
    }

    /// Path relative to the destination root
    pub fn relative_path(&self) -> PathBuf {
        match self.group {
            CardGroup::Major => PathBuf::from(MAJOR_DIR).join(&self.output_name),
            CardGroup::Minor(suit) => PathBuf::from(MINOR_DIR)
                .join(suit.as_str())
                .join(&self.output_name),
        }
    }

    /// Remote URL under the given base
    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.remote_name)
    }
}

/// The full 78-card catalog in download order
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::rider_waite()
    }
}

impl Catalog {
    /// Major arcana first, then each suit in rank order
    pub fn rider_waite() -> Self {
        let mut entries: Vec<CatalogEntry> = MAJOR_ARCANA
            .iter()
            .map(|(key, slug)| CatalogEntry::major(key, slug))
            .collect();

        for suit in SUITS {
            entries.extend(RANKS.iter().map(|rank| CatalogEntry::minor(suit, rank)));
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn major(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.group == CardGroup::Major)
    }

    pub fn suit(&self, suit: Suit) -> impl Iterator<Item = &CatalogEntry> {
        self.entries
            .iter()
            .filter(move |e| e.group == CardGroup::Minor(suit))
    }
}
