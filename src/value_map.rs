use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregated value for one period key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub balance: Decimal,
}

/// Period key to balance, kept in insertion order.
///
/// Insertion order is column order, so it is never sorted. A key that is not
/// present reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMap {
    entries: Vec<(String, PeriodValue)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map holding a zero balance for each key, in the given order.
    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut map = Self::new();
        for key in keys {
            map.add(key, Decimal::ZERO);
        }
        map
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&PeriodValue> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    pub fn balance(&self, key: &str) -> Decimal {
        self.get(key).map_or(Decimal::ZERO, |v| v.balance)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PeriodValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrites the balance at `key`, appending the key if it is new.
    pub fn set(&mut self, key: impl Into<String>, balance: Decimal) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.balance = balance,
            None => self.entries.push((key, PeriodValue { balance })),
        }
    }

    /// Adds `amount` to the balance at `key`, appending the key if it is new.
    pub fn add(&mut self, key: impl Into<String>, amount: Decimal) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.balance += amount,
            None => self.entries.push((key, PeriodValue { balance: amount })),
        }
    }

    /// Adds every balance of `other` into this map, key by key.
    pub fn accumulate(&mut self, other: &ValueMap) {
        for (key, value) in other.iter() {
            self.add(key, value.balance);
        }
    }

    /// Applies `op` over the union of keys of `a` and `b`, with a missing key
    /// on either side read as zero. Keys keep `a`'s order followed by the keys
    /// only `b` has.
    pub fn combine<F>(a: &ValueMap, b: &ValueMap, op: F) -> ValueMap
    where
        F: Fn(Decimal, Decimal) -> Decimal,
    {
        let mut result = ValueMap::new();
        for key in a.keys().chain(b.keys().filter(|k| !a.contains_key(k))) {
            result.set(key, op(a.balance(key), b.balance(key)));
        }
        result
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.balance.is_zero())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K: Into<String>> FromIterator<(K, Decimal)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (K, Decimal)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (key, balance) in iter {
            map.add(key, balance);
        }
        map
    }
}
