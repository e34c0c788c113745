//! Typed bindings over the Tip contract entry points. Reads go through
//! `eth_call`; writes go through the node's account management and return
//! a pending transaction hash the caller must confirm.

use alloy_primitives::{Address, U256};
use anyhow::Result;

use crate::abi;
pub use crate::abi::RawPost;
use crate::rpc;
use crate::settings::Settings;

pub fn get_all_posts(settings: &Settings) -> Result<Vec<RawPost>> {
    let data = rpc::eth_call(settings, &abi::encode_get_all_posts())?;
    abi::decode_post_array(&data)
}

pub fn get_user_posts(settings: &Settings, user: &Address) -> Result<Vec<RawPost>> {
    let data = rpc::eth_call(settings, &abi::encode_get_user_posts(user))?;
    abi::decode_post_array(&data)
}

/// `createPost(achievement, description)`, nonpayable.
pub fn create_post(
    settings: &Settings,
    from: &str,
    achievement: &str,
    description: &str,
) -> Result<String> {
    let calldata = abi::encode_create_post(achievement, description);
    rpc::send_transaction(settings, from, &calldata, None)
}

/// `tipPost(postId)`, payable. The tip amount rides in the value field.
pub fn tip_post(settings: &Settings, from: &str, post_id: U256, value: U256) -> Result<String> {
    let calldata = abi::encode_tip_post(post_id);
    rpc::send_transaction(settings, from, &calldata, Some(value))
}
