//! Reconciles raw ledger records into the display feed: field
//! normalization, newest-first ordering for the global view, and the
//! fallback policy for failed reads. Read failures never escape: the
//! global feed degrades to a fixed example set, the personal feed to an
//! empty list, and both are logged.

use std::convert::TryFrom;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::ledger::{self, RawPost};
use crate::settings::Settings;
use crate::util;

/// The display projection of a ledger post. Serialized with the field
/// names the original JSON surface used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: String,
    pub author_address: String,
    pub achievement: String,
    pub description: String,
    pub timestamp: String,
    pub tips: u64,
    pub tip_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    /// Live data read from the contract.
    Chain,
    /// The illustrative example set, shown when the read failed.
    Fixture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub source: FeedSource,
    pub posts: Vec<Post>,
}

/// The global feed. Never fails: a failed or malformed read is logged and
/// replaced by the example posts, so the view always has something to show.
pub fn global_feed(settings: &Settings) -> Feed {
    reconcile_global(ledger::get_all_posts(settings))
}

fn reconcile_global(fetched: anyhow::Result<Vec<RawPost>>) -> Feed {
    match fetched {
        Ok(raw) => {
            let mut posts: Vec<Post> = raw.iter().map(|r| normalize(r, false)).collect();
            // newest first
            posts.sort_by_key(|post| std::cmp::Reverse(util::timestamp_sort_key(&post.timestamp)));
            Feed {
                source: FeedSource::Chain,
                posts,
            }
        }
        Err(e) => {
            error!("fetch posts from the chain failed: {}", e);
            Feed {
                source: FeedSource::Fixture,
                posts: sample_posts(),
            }
        }
    }
}

/// The viewer's own posts, in ledger order. Degrades to an empty list.
pub fn personal_feed(settings: &Settings, viewer: &Address) -> Vec<Post> {
    match ledger::get_user_posts(settings, viewer) {
        Ok(raw) => raw.iter().map(|r| normalize(r, true)).collect(),
        Err(e) => {
            error!(
                "fetch posts for {} failed: {}",
                viewer.to_checksum(None),
                e
            );
            Vec::new()
        }
    }
}

fn normalize(raw: &RawPost, viewer_owned: bool) -> Post {
    let author_address = raw.author.to_checksum(None);
    let author = if viewer_owned {
        String::from("You")
    } else {
        util::truncate_address(&author_address)
    };

    Post {
        id: raw.id.to_string(),
        author,
        author_address,
        achievement: raw.achievement.clone(),
        description: raw.description.clone(),
        timestamp: util::iso_timestamp(u64::try_from(raw.timestamp).unwrap_or(0)),
        tips: u64::try_from(raw.tips).unwrap_or(u64::MAX),
        tip_amount: util::wei_to_pol(raw.tip_amount),
    }
}

/// Optimistic local update after a confirmed tip: one more tip, the
/// submitted amount added, no re-read of the ledger.
pub fn apply_tip(post: &mut Post, amount: f64) {
    post.tips += 1;
    post.tip_amount += amount;
}

/// Authors are never offered the tip action on their own posts.
pub fn can_tip(viewer: Option<&str>, post: &Post) -> bool {
    match viewer {
        Some(viewer) => !viewer.eq_ignore_ascii_case(&post.author_address),
        None => true,
    }
}

/// The example posts shown when the chain can not be read.
pub fn sample_posts() -> Vec<Post> {
    vec![
        Post {
            id: String::from("1"),
            author: String::from("0x742d...4567"),
            author_address: String::from("0x742d35Cc6634C0532925a3b8D0f4E6f8b1234567"),
            achievement: String::from("Completed my first marathon!"),
            description: String::from(
                "After 6 months of training, I finally completed the NYC Marathon in 4:15:32. \
                 The feeling of crossing that finish line was incredible!",
            ),
            timestamp: String::from("2024-01-10T10:30:00Z"),
            tips: 12,
            tip_amount: 0.25,
        },
        Post {
            id: String::from("2"),
            author: String::from("0x8ba1...def8"),
            author_address: String::from("0x8ba1f109551bD432803012645Hac136c8abcdef8"),
            achievement: String::from("Launched my startup"),
            description: String::from(
                "Today marks the official launch of my SaaS platform. It took 2 years of \
                 development, but we finally made it to market!",
            ),
            timestamp: String::from("2024-01-09T15:45:00Z"),
            tips: 8,
            tip_amount: 0.18,
        },
        Post {
            id: String::from("3"),
            author: String::from("0x123a...bcde"),
            author_address: String::from("0x123a4567890123456789012345678901234abcde"),
            achievement: String::from("Lost 30 pounds"),
            description: String::from(
                "Reached my weight loss goal through consistent diet and exercise. Feeling \
                 healthier and more confident than ever!",
            ),
            timestamp: String::from("2024-01-08T09:20:00Z"),
            tips: 15,
            tip_amount: 0.32,
        },
    ]
}
