//! Plain-text rendering of the view model.

use clicker::{ChannelStatus, Cue, GameView, LeaderboardEntry, LeaderboardRow, Pose};

pub fn game_lines(view: &GameView) -> Vec<String> {
    let score = view.score.map_or_else(|| "...".to_owned(), |s| s.to_string());
    let rank = view.position.map_or_else(|| "...".to_owned(), |p| format!("#{p}"));
    let mut lines = vec![
        format!(
            "{}  score {score}  rank {rank}  [{}]  user:{} board:{}",
            view.username,
            pose_label(view.pose),
            status_label(view.user_channel),
            status_label(view.leaderboard_channel),
        ),
        format!("Leaderboard {}", if view.leaderboard_expanded { "(all)" } else { "(top)" }),
    ];
    lines.extend(view.rows.iter().map(row_line));
    lines
}

pub fn leaderboard_lines(entries: &[LeaderboardEntry]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let position = e.position.unwrap_or_else(|| u32::try_from(i + 1).unwrap_or(u32::MAX));
            format!("  {position}. {}: {}", e.username, e.score)
        })
        .collect()
}

pub fn cue_line(cue: Cue) -> &'static str {
    match cue {
        Cue::Click => "*click*",
        Cue::Eating => "*nom nom*",
    }
}

fn row_line(row: &LeaderboardRow) -> String {
    let marker = if row.is_current_user { '>' } else { ' ' };
    format!("{marker} {}. {}: {}", row.position, row.username, row.score)
}

fn pose_label(pose: Pose) -> &'static str {
    match pose {
        Pose::Idle => "idle",
        Pose::Smiling => "smiling",
        Pose::Eating => "eating",
    }
}

fn status_label(status: ChannelStatus) -> &'static str {
    match status {
        ChannelStatus::Closed => "closed",
        ChannelStatus::Connecting => "connecting",
        ChannelStatus::Open => "open",
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
