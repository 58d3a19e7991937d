//! Catalog views derived from upstream data
//!
//! Card routing, episode navigation, schedule ordering and episode search.
//! Everything here is synchronous and works on already-fetched records.

use chrono::Weekday;
use std::collections::HashMap;

use crate::constants::site::{DAY_ORDER, HERO_SLIDES, PLACEHOLDER_IMAGE};
use crate::models::{
    AnimeCard, AnimeItem, EpisodeRef, FeedPage, FeedView, Schedule, ScheduleDay, SlugRoute,
};
use crate::slug;

/// Site path a slug links to
pub fn href_for(slug: &str) -> String {
    if slug::is_episode(slug) {
        format!("/watch/{}", slug)
    } else {
        format!("/anime/{}", slug)
    }
}

/// Full routing information for a slug
pub fn resolve(slug: &str) -> SlugRoute {
    SlugRoute {
        slug: slug.to_string(),
        kind: slug::classify(slug),
        href: href_for(slug),
        series_slug: slug::series_slug(slug).to_string(),
        episode_number: slug::episode_number(slug).map(str::to_string),
    }
}

pub fn to_card(item: AnimeItem) -> AnimeCard {
    let cover = match item.cover() {
        "" => PLACEHOLDER_IMAGE.to_string(),
        cover => cover.to_string(),
    };
    AnimeCard {
        cover,
        href: href_for(&item.slug),
        is_episode: slug::is_episode(&item.slug),
        item,
    }
}

/// Turn a feed page into cards, adding hero slides when asked
pub fn feed_view(page: FeedPage, with_hero: bool) -> FeedView {
    let items: Vec<AnimeCard> = page.anime.into_iter().map(to_card).collect();
    let hero = if with_hero {
        items.iter().take(HERO_SLIDES).cloned().collect()
    } else {
        Vec::new()
    };

    FeedView {
        page: page.page,
        total_pages: page.total_pages,
        items,
        hero,
        query: page.query,
    }
}

/// Previous and next episode slugs around `current`
///
/// `episodes` is newest first, so the previous episode sits one index later
/// and the next one an index earlier.
pub fn episode_navigation(
    episodes: &[EpisodeRef],
    current: &str,
) -> (Option<String>, Option<String>) {
    let Some(index) = episodes.iter().position(|ep| ep.slug == current) else {
        return (None, None);
    };

    let previous = episodes.get(index + 1).map(|ep| ep.slug.clone());
    let next = index
        .checked_sub(1)
        .and_then(|i| episodes.get(i))
        .map(|ep| ep.slug.clone());
    (previous, next)
}

/// Episodes whose label or title contains `query`, ignoring case
pub fn filter_episodes<'a>(episodes: &'a [EpisodeRef], query: &str) -> Vec<&'a EpisodeRef> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return episodes.iter().collect();
    }
    episodes
        .iter()
        .filter(|ep| {
            ep.episode.to_lowercase().contains(&needle) || ep.title.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Index of a weekday in [`DAY_ORDER`]
fn day_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

/// Keep the first position of each slug but the last record seen for it
fn dedup_by_slug(items: &[AnimeItem]) -> Vec<AnimeItem> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<AnimeItem> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(item.slug.as_str()) {
            Some(&pos) => unique[pos] = item.clone(),
            None => {
                positions.insert(&item.slug, unique.len());
                unique.push(item.clone());
            }
        }
    }
    unique
}

/// Order the weekly schedule starting from `today`
///
/// Days with no entries are dropped. Day names the upstream sends that are
/// not known weekdays go last, in name order.
pub fn order_schedule(schedule: &Schedule, today: Weekday) -> Vec<ScheduleDay> {
    let start = day_index(today);
    let mut days: Vec<&str> = (0..DAY_ORDER.len())
        .map(|offset| DAY_ORDER[(start + offset) % DAY_ORDER.len()])
        .collect();
    days.extend(
        schedule
            .keys()
            .map(String::as_str)
            .filter(|day| !DAY_ORDER.contains(day)),
    );

    days.into_iter()
        .filter_map(|day| {
            let items = schedule.get(day).filter(|items| !items.is_empty())?;
            Some(ScheduleDay {
                day: day.to_string(),
                is_today: day == DAY_ORDER[start],
                items: dedup_by_slug(items).into_iter().map(to_card).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::SlugKind;

    fn item(slug: &str, title: &str) -> AnimeItem {
        AnimeItem {
            slug: slug.to_string(),
            title: title.to_string(),
            thumbnail: None,
            image: None,
            anime_type: "TV".to_string(),
            latest_episode: String::new(),
            episode: None,
            release_time: None,
        }
    }

    fn episode(slug: &str, label: &str, title: &str) -> EpisodeRef {
        EpisodeRef {
            slug: slug.to_string(),
            episode: label.to_string(),
            title: title.to_string(),
            date: String::new(),
        }
    }

    fn newest_first() -> Vec<EpisodeRef> {
        vec![
            episode("op-episode-3", "3", "The Sea"),
            episode("op-episode-2", "2", "The Ship"),
            episode("op-episode-1", "1", "Romance Dawn"),
        ]
    }

    #[test]
    fn test_href_routes_episodes_to_watch() {
        assert_eq!(href_for("one-piece-episode-1"), "/watch/one-piece-episode-1");
        assert_eq!(href_for("naruto-ep-5"), "/watch/naruto-ep-5");
        assert_eq!(href_for("one-piece"), "/anime/one-piece");
        // Not a token marker, so it is a series
        assert_eq!(href_for("deep-sleep-5"), "/anime/deep-sleep-5");
    }

    #[test]
    fn test_resolve_episode() {
        let route = resolve("bleach-episode-12-sub-indo");
        assert_eq!(route.kind, SlugKind::Episode);
        assert_eq!(route.href, "/watch/bleach-episode-12-sub-indo");
        assert_eq!(route.series_slug, "bleach");
        assert_eq!(route.episode_number.as_deref(), Some("12"));
    }

    #[test]
    fn test_resolve_series() {
        let route = resolve("bleach");
        assert_eq!(route.kind, SlugKind::Series);
        assert_eq!(route.series_slug, "bleach");
        assert_eq!(route.episode_number, None);
    }

    #[test]
    fn test_card_cover_falls_back_to_placeholder() {
        let card = to_card(item("a", "A"));
        assert_eq!(card.cover, PLACEHOLDER_IMAGE);
        assert!(!card.is_episode);
    }

    #[test]
    fn test_feed_view_hero_takes_first_five() {
        let page = FeedPage {
            page: 1,
            total_pages: Some(10),
            anime: (0..8).map(|i| item(&format!("s{}", i), "S")).collect(),
            query: None,
        };

        let view = feed_view(page.clone(), true);
        assert_eq!(view.items.len(), 8);
        assert_eq!(view.hero.len(), 5);
        assert_eq!(view.hero[0].item.slug, "s0");

        let view = feed_view(page, false);
        assert!(view.hero.is_empty());
    }

    #[test]
    fn test_navigation_in_the_middle() {
        let (prev, next) = episode_navigation(&newest_first(), "op-episode-2");
        assert_eq!(prev.as_deref(), Some("op-episode-1"));
        assert_eq!(next.as_deref(), Some("op-episode-3"));
    }

    #[test]
    fn test_navigation_at_the_ends() {
        let episodes = newest_first();
        assert_eq!(
            episode_navigation(&episodes, "op-episode-3"),
            (Some("op-episode-2".to_string()), None)
        );
        assert_eq!(
            episode_navigation(&episodes, "op-episode-1"),
            (None, Some("op-episode-2".to_string()))
        );
    }

    #[test]
    fn test_navigation_unknown_episode() {
        assert_eq!(episode_navigation(&newest_first(), "missing"), (None, None));
        assert_eq!(episode_navigation(&[], "op-episode-1"), (None, None));
    }

    #[test]
    fn test_filter_episodes_by_label_or_title() {
        let episodes = newest_first();
        let hits: Vec<&str> = filter_episodes(&episodes, "SHIP")
            .into_iter()
            .map(|ep| ep.slug.as_str())
            .collect();
        assert_eq!(hits, vec!["op-episode-2"]);

        assert_eq!(filter_episodes(&episodes, "1").len(), 1);
        assert_eq!(filter_episodes(&episodes, "  ").len(), 3);
        assert!(filter_episodes(&episodes, "zzz").is_empty());
    }

    #[test]
    fn test_schedule_starts_today_and_skips_empty_days() {
        let mut schedule = Schedule::new();
        schedule.insert("Senin".to_string(), vec![item("a", "A")]);
        schedule.insert("Rabu".to_string(), vec![item("b", "B")]);
        schedule.insert("Selasa".to_string(), vec![]);
        schedule.insert("Minggu".to_string(), vec![item("c", "C")]);

        let days = order_schedule(&schedule, Weekday::Tue);
        let names: Vec<&str> = days.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(names, vec!["Rabu", "Minggu", "Senin"]);
        assert!(days.iter().all(|d| !d.is_today));

        let days = order_schedule(&schedule, Weekday::Mon);
        assert_eq!(days[0].day, "Senin");
        assert!(days[0].is_today);
    }

    #[test]
    fn test_schedule_dedups_keeping_first_position_last_value() {
        let mut schedule = Schedule::new();
        schedule.insert(
            "Kamis".to_string(),
            vec![item("a", "old"), item("b", "B"), item("a", "new")],
        );

        let days = order_schedule(&schedule, Weekday::Thu);
        let entries: Vec<(&str, &str)> = days[0]
            .items
            .iter()
            .map(|c| (c.item.slug.as_str(), c.item.title.as_str()))
            .collect();
        assert_eq!(entries, vec![("a", "new"), ("b", "B")]);
    }

    #[test]
    fn test_schedule_unknown_days_go_last() {
        let mut schedule = Schedule::new();
        schedule.insert("Random".to_string(), vec![item("x", "X")]);
        schedule.insert("Sabtu".to_string(), vec![item("y", "Y")]);

        let days = order_schedule(&schedule, Weekday::Sun);
        let names: Vec<&str> = days.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(names, vec!["Sabtu", "Random"]);
    }
}
