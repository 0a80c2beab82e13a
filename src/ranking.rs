use crate::models::{LeaderboardSummary, Member, ParticipationTotals, RankedEntry};
use crate::search;
use std::cmp::Reverse;

/// Orders members by stored `points`, highest first.
///
/// `sort_by_key` is stable, so members with equal points keep the order the store
/// returned them in. Ranks are positional: ties still get distinct, consecutive ranks.
pub fn rank<'a, I>(members: I) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = &'a Member>,
{
    let mut ordered: Vec<&Member> = members.into_iter().collect();
    ordered.sort_by_key(|member| Reverse(member.points));
    ordered
        .into_iter()
        .enumerate()
        .map(|(position, member)| RankedEntry {
            member: member.clone(),
            rank: position + 1,
        })
        .collect()
}

pub fn filter_then_rank(members: &[Member], query: &str) -> Vec<RankedEntry> {
    rank(search::filter(members, query))
}

pub fn participation(member: &Member) -> ParticipationTotals {
    ParticipationTotals {
        coordinated: member.events_coordinated,
        volunteered: member.events_volunteered,
        attended: member.events_attended,
        bonus: member.bonus_points,
        total_events: member
            .events_coordinated
            .saturating_add(member.events_volunteered)
            .saturating_add(member.events_attended),
    }
}

pub fn summarize(members: &[Member]) -> LeaderboardSummary {
    LeaderboardSummary {
        member_count: members.len(),
        active_count: members.iter().filter(|member| member.active).count(),
        top_points: members.iter().map(|member| member.points).max(),
    }
}
