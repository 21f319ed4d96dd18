use crate::directory::UserDirectory;
use crate::store::{StatRecord, StatsStore};

pub const HEADER: &str = "🏆 **Classement des victimes** 🏆\n\n";
pub const EMPTY_MESSAGE: &str = "Aucune statistique disponible";
pub const ERROR_MESSAGE: &str = "Erreur lors de la génération du classement.";

/// One rendered line of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub display_name: String,
    pub feur_count: i64,
    pub coubeh_count: i64,
    pub total_count: i64,
}

impl LeaderboardEntry {
    fn from_record(rank: u64, display_name: String, record: &StatRecord) -> Self {
        Self {
            rank,
            display_name,
            feur_count: record.feur_count,
            coubeh_count: record.coubeh_count,
            total_count: record.total_count,
        }
    }

    pub fn line(&self) -> String {
        format!(
            "{} **{}** : {} fois ({} feur, {} coubeh)",
            position_marker(self.rank),
            self.display_name,
            self.total_count,
            self.feur_count,
            self.coubeh_count
        )
    }
}

pub fn position_marker(rank: u64) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{}.", n),
    }
}

/// Resolve the entries of one page. Users the directory cannot resolve are
/// skipped; the others keep their absolute rank.
pub async fn page_entries(
    directory: &dyn UserDirectory,
    records: &[StatRecord],
    page: u32,
    page_size: u32,
) -> Vec<LeaderboardEntry> {
    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    let mut entries = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        let rank = offset + index as u64 + 1;
        match directory.display_name(&record.user_id).await {
            Ok(name) => entries.push(LeaderboardEntry::from_record(rank, name, record)),
            Err(e) => {
                tracing::warn!("Failed to resolve user {}: {}", record.user_id, e);
            }
        }
    }

    entries
}

/// Text of one leaderboard page. Never fails: storage errors produce an
/// error message instead.
pub async fn render_page(
    store: &dyn StatsStore,
    directory: &dyn UserDirectory,
    server_id: &str,
    page: u32,
    page_size: u32,
) -> String {
    let records = match store.fetch_page(server_id, page, page_size).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to build leaderboard for {}: {}", server_id, e);
            return ERROR_MESSAGE.to_string();
        }
    };

    let entries = page_entries(directory, &records, page, page_size).await;
    if entries.is_empty() {
        return EMPTY_MESSAGE.to_string();
    }

    let mut text = String::from(HEADER);
    for entry in &entries {
        text.push_str(&entry.line());
        text.push('\n');
    }
    text
}
