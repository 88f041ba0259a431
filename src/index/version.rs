// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! PEP 440 version parsing and ordering.

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(
        r"(?ix)
        ^\s*v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?:-(?P<post_n1>[0-9]+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$"
    )
    .unwrap();
}

/// Pre-release phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrePhase {
    Alpha,
    Beta,
    Rc,
}

/// A parsed PEP 440 version.
#[derive(Debug, Clone)]
pub struct PackageVersion {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PrePhase, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
}

impl PackageVersion {
    /// Parse a version string. Returns `None` for non-PEP 440 input.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(input)?;
        let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());

        let release = caps["release"]
            .split('.')
            .map(|s| s.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;

        let pre = caps.name("pre_l").map(|l| {
            let phase = match l.as_str().to_lowercase().as_str() {
                "a" | "alpha" => PrePhase::Alpha,
                "b" | "beta" => PrePhase::Beta,
                _ => PrePhase::Rc,
            };
            (phase, num("pre_n").unwrap_or(0))
        });

        let post = if caps.name("post_n1").is_some() {
            num("post_n1")
        } else if caps.name("post_l").is_some() {
            Some(num("post_n2").unwrap_or(0))
        } else {
            None
        };

        let dev = caps.name("dev_l").map(|_| num("dev_n").unwrap_or(0));

        Some(Self {
            epoch: num("epoch").unwrap_or(0),
            release,
            pre,
            post,
            dev,
            local: caps.name("local").map(|m| m.as_str().to_lowercase()),
        })
    }

    /// Whether this is a pre-release (alpha, beta, rc or dev).
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    fn release_trimmed(&self) -> &[u64] {
        let len = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        &self.release[..len]
    }

    // Sort key for the pre segment: a bare dev release sorts before any
    // pre-release of the same release, and a final release after all of them.
    fn pre_key(&self) -> (i8, Option<PrePhase>, u64) {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (-1, None, 0),
            (None, _, _) => (1, None, 0),
            (Some((phase, n)), _, _) => (0, Some(phase), n),
        }
    }

    fn post_key(&self) -> i128 {
        self.post.map(i128::from).unwrap_or(-1)
    }

    fn dev_key(&self) -> i128 {
        self.dev.map(i128::from).unwrap_or(i128::MAX)
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.release_trimmed().cmp(other.release_trimmed()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}

/// Whether a version string denotes a pre-release.
pub fn is_prerelease(version: &str) -> bool {
    PackageVersion::parse(version)
        .map(|v| v.is_prerelease())
        .unwrap_or(false)
}

/// Compare two version strings. Valid versions outrank invalid ones;
/// two invalid versions compare as text.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (PackageVersion::parse(a), PackageVersion::parse(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// The greatest version in a list.
pub fn max_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .max_by(|a, b| compare_versions(a, b))
}
