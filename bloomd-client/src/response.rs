//! # Response Parsing
//!
//! Purpose: Turn raw daemon text into typed results or classified errors.
//!
//! ## Design Principles
//! 1. **Stateless**: Pure functions over the text the transport returned.
//! 2. **Uniform Absence**: `Filter does not exist` maps to
//!    `ClientError::FilterNotExist` for every verb; only `drop` folds it
//!    into success.
//! 3. **Fail Whole**: One malformed line rejects the entire response.

use std::collections::HashMap;

use bloomd_common::{
    BloomFilter, VerboseBloomFilter, Verb, RESPONSE_DELETE_IN_PROGRESS, RESPONSE_DONE,
    RESPONSE_EXISTS, RESPONSE_FILTER_NOT_EXIST, RESPONSE_FILTER_NOT_PROXIED, RESPONSE_NO,
    RESPONSE_YES,
};

use crate::error::{ClientError, ClientResult};

fn protocol(verb: Verb, response: &str) -> ClientError {
    ClientError::Protocol {
        verb,
        response: response.to_string(),
    }
}

/// `Yes` / `No` reply to set or check.
pub fn parse_bool(verb: Verb, resp: &str) -> ClientResult<bool> {
    match resp {
        RESPONSE_YES => Ok(true),
        RESPONSE_NO => Ok(false),
        RESPONSE_FILTER_NOT_EXIST => Err(ClientError::FilterNotExist { verb }),
        _ => Err(protocol(verb, resp)),
    }
}

/// Space separated `Yes` / `No` reply to bulk or multi, one token per key.
pub fn parse_bool_list(verb: Verb, expected: usize, resp: &str) -> ClientResult<Vec<bool>> {
    if resp == RESPONSE_FILTER_NOT_EXIST {
        return Err(ClientError::FilterNotExist { verb });
    }
    if !resp.starts_with(RESPONSE_YES) && !resp.starts_with(RESPONSE_NO) {
        return Err(protocol(verb, resp));
    }

    let mut results = Vec::with_capacity(expected);
    for token in resp.split(' ') {
        match token {
            RESPONSE_YES => results.push(true),
            RESPONSE_NO => results.push(false),
            _ => return Err(protocol(verb, resp)),
        }
    }
    if results.len() != expected {
        return Err(protocol(verb, resp));
    }
    Ok(results)
}

/// `Done` reply to close, clear and flush.
pub fn parse_confirmation(verb: Verb, resp: &str) -> ClientResult<()> {
    match resp {
        RESPONSE_DONE => Ok(()),
        RESPONSE_FILTER_NOT_EXIST => Err(ClientError::FilterNotExist { verb }),
        RESPONSE_FILTER_NOT_PROXIED if verb == Verb::Clear => Err(ClientError::FilterNotProxied),
        _ => Err(protocol(verb, resp)),
    }
}

/// Reply to drop. A missing filter counts as dropped.
pub fn parse_drop_confirmation(resp: &str) -> ClientResult<()> {
    match resp {
        RESPONSE_DONE | RESPONSE_FILTER_NOT_EXIST => Ok(()),
        _ => Err(protocol(Verb::Drop, resp)),
    }
}

/// Reply to create. An existing filter counts as created.
pub fn parse_create_confirmation(resp: &str) -> ClientResult<()> {
    match resp {
        RESPONSE_DONE | RESPONSE_EXISTS => Ok(()),
        // The daemon has not finished deleting a filter with this name yet.
        RESPONSE_DELETE_IN_PROGRESS => Err(ClientError::DeleteInProgress),
        _ => Err(protocol(Verb::Create, resp)),
    }
}

/// Block of `key value` lines returned by info.
pub fn parse_info(name: &str, resp: &str) -> ClientResult<VerboseBloomFilter> {
    if resp == RESPONSE_FILTER_NOT_EXIST {
        return Err(ClientError::FilterNotExist { verb: Verb::Info });
    }

    if resp.is_empty() {
        return Err(protocol(Verb::Info, resp));
    }

    let mut counters: HashMap<&str, u64> = HashMap::new();
    let mut probability = 0.0f32;
    for line in resp.lines() {
        let mut parts = line.split(' ');
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key, value),
            _ => return Err(protocol(Verb::Info, resp)),
        };
        if key == "probability" {
            probability = value.parse().map_err(|_| protocol(Verb::Info, resp))?;
        } else {
            let value = value.parse().map_err(|_| protocol(Verb::Info, resp))?;
            counters.insert(key, value);
        }
    }

    let get = |key: &str| counters.get(key).copied().unwrap_or(0);
    Ok(VerboseBloomFilter {
        filter: BloomFilter {
            name: name.to_string(),
            capacity: get("capacity"),
            probability,
            size: get("size"),
            storage: get("storage"),
        },
        checks: get("checks"),
        check_hits: get("check_hits"),
        check_misses: get("check_misses"),
        page_ins: get("page_ins"),
        page_outs: get("page_outs"),
        sets: get("sets"),
        set_hits: get("set_hits"),
        set_misses: get("set_misses"),
    })
}

/// Block of `name probability storage capacity size` rows returned by list.
pub fn parse_filter_list(resp: &str) -> ClientResult<Vec<BloomFilter>> {
    let mut filters = Vec::new();
    for line in resp.lines() {
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() != 5 {
            return Err(protocol(Verb::List, resp));
        }
        let malformed = || protocol(Verb::List, resp);
        filters.push(BloomFilter {
            name: fields[0].to_string(),
            probability: fields[1].parse().map_err(|_| malformed())?,
            storage: fields[2].parse().map_err(|_| malformed())?,
            capacity: fields[3].parse().map_err(|_| malformed())?,
            size: fields[4].parse().map_err(|_| malformed())?,
        });
    }
    Ok(filters)
}
