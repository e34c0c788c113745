//! Minimal ABI codec for the Tip contract. Covers exactly what the four
//! entry points need: value types in 32-byte words, dynamic strings, and
//! the dynamic `Post[]` tuple array that `getAllPosts`/`getUserPosts`
//! return. Return data is bounds-checked word by word; anything malformed
//! becomes an error for the caller to degrade.

use std::convert::TryFrom;

use alloy_primitives::{keccak256, Address, U256};
use anyhow::{anyhow, Result};

const WORD: usize = 32;

/// One record of the contract's `Post[]` return tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub id: U256,
    pub author: Address,
    pub achievement: String,
    pub description: String,
    pub timestamp: U256,
    pub tips: U256,
    pub tip_amount: U256,
}

/// First four bytes of the keccak hash of the canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn pad32(len: usize) -> usize {
    (len + WORD - 1) / WORD * WORD
}

fn push_u256(out: &mut Vec<u8>, value: U256) {
    out.extend_from_slice(&value.to_be_bytes::<32>());
}

fn push_usize(out: &mut Vec<u8>, value: usize) {
    push_u256(out, U256::from(value));
}

fn push_address(out: &mut Vec<u8>, address: &Address) {
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(address.as_slice());
}

fn push_string(out: &mut Vec<u8>, s: &str) {
    push_usize(out, s.len());
    out.extend_from_slice(s.as_bytes());
    out.resize(out.len() + pad32(s.len()) - s.len(), 0);
}

/// `getAllPosts()`
pub fn encode_get_all_posts() -> Vec<u8> {
    selector("getAllPosts()").to_vec()
}

/// `getUserPosts(address)`
pub fn encode_get_user_posts(user: &Address) -> Vec<u8> {
    let mut data = selector("getUserPosts(address)").to_vec();
    push_address(&mut data, user);
    data
}

/// `createPost(string,string)` has two dynamic arguments, so the head holds
/// their offsets and the tail carries the length-prefixed padded bytes.
pub fn encode_create_post(achievement: &str, description: &str) -> Vec<u8> {
    let mut data = selector("createPost(string,string)").to_vec();
    let first_tail = 2 * WORD;
    let second_tail = first_tail + WORD + pad32(achievement.len());
    push_usize(&mut data, first_tail);
    push_usize(&mut data, second_tail);
    push_string(&mut data, achievement);
    push_string(&mut data, description);
    data
}

/// `tipPost(uint256)`. The tip itself rides in the transaction value.
pub fn encode_tip_post(post_id: U256) -> Vec<u8> {
    let mut data = selector("tipPost(uint256)").to_vec();
    push_u256(&mut data, post_id);
    data
}

fn word(data: &[u8], pos: usize) -> Result<&[u8]> {
    data.get(pos..pos + WORD)
        .ok_or_else(|| anyhow!("return data truncated at offset {}", pos))
}

fn read_u256(data: &[u8], pos: usize) -> Result<U256> {
    Ok(U256::from_be_slice(word(data, pos)?))
}

fn read_usize(data: &[u8], pos: usize) -> Result<usize> {
    let value = read_u256(data, pos)?;
    let value = u64::try_from(value)
        .map_err(|_| anyhow!("offset at {} does not fit in a machine word", pos))?;
    let value = value as usize;
    if value > data.len() {
        return Err(anyhow!(
            "offset {} at {} points past the {} bytes of return data",
            value,
            pos,
            data.len()
        ));
    }
    Ok(value)
}

fn read_address(data: &[u8], pos: usize) -> Result<Address> {
    let w = word(data, pos)?;
    Ok(Address::from_slice(&w[12..]))
}

fn read_string(data: &[u8], pos: usize) -> Result<String> {
    let len = read_usize(data, pos)?;
    let start = pos + WORD;
    let bytes = data
        .get(start..start + len)
        .ok_or_else(|| anyhow!("string truncated at offset {}", pos))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| anyhow!("string is not valid UTF-8: {}", e))
}

/// Decode the `Tip.Post[]` return blob. The tuple contains strings, so
/// both the array elements and the strings inside each element are reached
/// through relative offsets.
pub fn decode_post_array(data: &[u8]) -> Result<Vec<RawPost>> {
    let array_at = read_usize(data, 0)?;
    let len = read_usize(data, array_at)?;
    let heads = array_at + WORD;

    let mut posts = Vec::with_capacity(len);
    for idx in 0..len {
        let elem = heads + read_usize(data, heads + idx * WORD)?;
        let achievement_at = elem + read_usize(data, elem + 2 * WORD)?;
        let description_at = elem + read_usize(data, elem + 3 * WORD)?;

        posts.push(RawPost {
            id: read_u256(data, elem)?,
            author: read_address(data, elem + WORD)?,
            achievement: read_string(data, achievement_at)?,
            description: read_string(data, description_at)?,
            timestamp: read_u256(data, elem + 4 * WORD)?,
            tips: read_u256(data, elem + 5 * WORD)?,
            tip_amount: read_u256(data, elem + 6 * WORD)?,
        });
    }
    Ok(posts)
}
