//! The settlement optimizer (§4.3): given a ledger snapshot, produces the
//! settlement with the maximum number of independent zero-sum components,
//! which is equivalent to minimizing the number of transfers.
//!
//! The search works on normalized integer magnitudes (balances times 100)
//! so subset-sum comparisons are exact; final transfer amounts are
//! reconstructed from those same integers, which is lossless because every
//! `Money` value is already held at scale 2.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::money::Money;
use crate::user::User;

/// A single required payment: `debtor` must transfer `amount` to `creditor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub debtor: User,
    pub creditor: User,
    pub amount: Money,
}

impl std::fmt::Display for Settlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} owes {} {}", self.debtor, self.creditor, self.amount)
    }
}

/// A user's magnitude (absolute balance in cents) tracked alongside its
/// identity and original signed `Money` value, used throughout the search.
#[derive(Debug, Clone)]
struct MagEntry {
    user: User,
    magnitude: i64,
    original: Money,
}

/// One zero-sum group of creditors and debtors, discovered by `find_partition`.
struct Component {
    creditors: Vec<MagEntry>,
    debtors: Vec<MagEntry>,
}

/// Produces the settlement statements that zero every balance in `ledger`,
/// maximizing the number of independent components (§4.3). Cannot fail on
/// well-formed input; returns the empty list for an empty ledger.
pub fn generate_statements(ledger: &Ledger) -> Vec<Settlement> {
    let snapshot = ledger.snapshot();
    if snapshot.is_empty() {
        return Vec::new();
    }

    let mut creditors: Vec<MagEntry> = snapshot
        .iter()
        .filter(|(_, m)| m.is_positive())
        .map(|(u, m)| MagEntry {
            user: u.clone(),
            magnitude: m.cents(),
            original: *m,
        })
        .collect();
    let mut debtors: Vec<MagEntry> = snapshot
        .iter()
        .filter(|(_, m)| m.is_negative())
        .map(|(u, m)| MagEntry {
            user: u.clone(),
            magnitude: m.abs().cents(),
            original: m.abs(),
        })
        .collect();

    creditors.sort_by_key(|e| e.magnitude);
    debtors.sort_by_key(|e| e.magnitude);

    let mut statements = pair_reduction(&mut creditors, &mut debtors);

    if !creditors.is_empty() && !debtors.is_empty() {
        let total_sum: i64 = creditors.iter().map(|e| e.magnitude).sum();
        let target_sum = creditors[0].magnitude.max(debtors[0].magnitude);
        debug!(
            "settlement phase B: {} creditors, {} debtors, totalSum={} targetSum={}",
            creditors.len(),
            debtors.len(),
            total_sum,
            target_sum
        );
        let (component_count, components) =
            find_partition(creditors, debtors, 2, total_sum, target_sum);
        debug!("settlement phase B found {} components", component_count);
        for component in &components {
            statements.extend(settle_component(component));
        }
    }

    statements
}

/// Phase A: peels off exact creditor/debtor magnitude matches, which are
/// always part of some optimal settlement. Mutates `creditors`/`debtors` in
/// place, leaving only the entries still needing Phase B/C.
fn pair_reduction(creditors: &mut Vec<MagEntry>, debtors: &mut Vec<MagEntry>) -> Vec<Settlement> {
    let mut statements = Vec::new();
    let mut ci = 0;
    while ci < creditors.len() {
        let cred_mag = creditors[ci].magnitude;
        let max_debtor_mag = match debtors.iter().map(|d| d.magnitude).max() {
            Some(m) => m,
            None => break,
        };
        if cred_mag > max_debtor_mag {
            break;
        }
        match debtors.iter().position(|d| d.magnitude == cred_mag) {
            Some(pos) => {
                let creditor = creditors.remove(ci);
                let debtor = debtors.remove(pos);
                statements.push(Settlement {
                    debtor: debtor.user,
                    creditor: creditor.user,
                    amount: creditor.original,
                });
            }
            None => ci += 1,
        }
    }
    statements
}

/// Phase B: recursively searches for the partition of `c`/`d` into the
/// maximum number of zero-sum components. Returns the component count and
/// the partition itself.
fn find_partition(
    c: Vec<MagEntry>,
    d: Vec<MagEntry>,
    min_components: usize,
    total_sum: i64,
    target_sum: i64,
) -> (usize, Vec<Component>) {
    if c.is_empty() && d.is_empty() {
        return (0, Vec::new());
    }

    let mut best_count = 1;
    let c_mags: Vec<i64> = c.iter().map(|e| e.magnitude).collect();
    let d_mags: Vec<i64> = d.iter().map(|e| e.magnitude).collect();
    let mut best_components = vec![Component {
        creditors: c.clone(),
        debtors: d.clone(),
    }];
    let mut min_components = min_components.max(2);

    let mut t = target_sum;
    while total_sum > 0 && t.saturating_mul(min_components as i64) <= total_sum {
        let c_sets = subset_sums(&c_mags, t);
        let d_sets = subset_sums(&d_mags, t);

        for cs in &c_sets {
            for ds in &d_sets {
                let component_creditors: Vec<MagEntry> =
                    cs.iter().map(|&i| c[i].clone()).collect();
                let component_debtors: Vec<MagEntry> = ds.iter().map(|&i| d[i].clone()).collect();

                let remaining_c: Vec<MagEntry> = c
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !cs.contains(i))
                    .map(|(_, e)| e.clone())
                    .collect();
                let remaining_d: Vec<MagEntry> = d
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !ds.contains(i))
                    .map(|(_, e)| e.clone())
                    .collect();

                let remaining_total = total_sum - t;
                let smallest_remaining = remaining_c
                    .iter()
                    .chain(remaining_d.iter())
                    .map(|e| e.magnitude)
                    .min()
                    .unwrap_or(t);
                let next_target = t.max(smallest_remaining);
                let next_min_components = min_components.saturating_sub(1).max(2);

                let (sub_count, sub_components) = find_partition(
                    remaining_c,
                    remaining_d,
                    next_min_components,
                    remaining_total,
                    next_target,
                );
                let total_count = 1 + sub_count;
                if total_count > best_count {
                    best_count = total_count;
                    let mut components = vec![Component {
                        creditors: component_creditors,
                        debtors: component_debtors,
                    }];
                    components.extend(sub_components);
                    best_components = components;
                    min_components = best_count + 1;
                }
            }
        }
        t += 1;
    }

    (best_count, best_components)
}

/// The subset-sum enumerator (§4.3): every subset of `values` (assumed
/// sorted ascending) summing exactly to `target`, returned as sorted index
/// lists in lexicographic order. `values` are all strictly positive, so a
/// subset can never be extended once it reaches the target.
fn subset_sums(values: &[i64], target: i64) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    subset_sums_from(values, 0, target, &mut current, &mut out);
    out
}

fn subset_sums_from(
    values: &[i64],
    start: usize,
    target: i64,
    current: &mut Vec<usize>,
    out: &mut Vec<Vec<usize>>,
) {
    if target == 0 {
        if !current.is_empty() {
            out.push(current.clone());
        }
        return;
    }
    for i in start..values.len() {
        if values[i] > target {
            break;
        }
        current.push(i);
        subset_sums_from(values, i + 1, target - values[i], current, out);
        current.pop();
    }
}

/// The engine-level fallback settlement (§5): treats the whole ledger as one
/// component and runs Phase C directly, skipping the Phase B partition
/// search entirely. Used when a configured wall-clock settlement budget is
/// exceeded; never used by `generate_statements` itself.
pub fn trivial_settlement(ledger: &Ledger) -> Vec<Settlement> {
    let snapshot = ledger.snapshot();
    if snapshot.is_empty() {
        return Vec::new();
    }
    let creditors = snapshot
        .iter()
        .filter(|(_, m)| m.is_positive())
        .map(|(u, m)| MagEntry {
            user: u.clone(),
            magnitude: m.cents(),
            original: *m,
        })
        .collect();
    let debtors = snapshot
        .iter()
        .filter(|(_, m)| m.is_negative())
        .map(|(u, m)| MagEntry {
            user: u.clone(),
            magnitude: m.abs().cents(),
            original: m.abs(),
        })
        .collect();
    settle_component(&Component { creditors, debtors })
}

/// Phase C: settles a single zero-sum component by repeatedly matching the
/// smallest remaining creditor against the smallest remaining debtor. Uses
/// at most `|component| - 1` transfers and minimizes total cash moved.
fn settle_component(component: &Component) -> Vec<Settlement> {
    let mut creditors: Vec<(User, i64)> = component
        .creditors
        .iter()
        .map(|e| (e.user.clone(), e.magnitude))
        .collect();
    let mut debtors: Vec<(User, i64)> = component
        .debtors
        .iter()
        .map(|e| (e.user.clone(), e.magnitude))
        .collect();
    creditors.sort_by_key(|(_, m)| *m);
    debtors.sort_by_key(|(_, m)| *m);

    let mut statements = Vec::new();
    let mut ci = 0;
    let mut di = 0;
    while ci < creditors.len() && di < debtors.len() {
        let amount = creditors[ci].1.min(debtors[di].1);
        statements.push(Settlement {
            debtor: debtors[di].0.clone(),
            creditor: creditors[ci].0.clone(),
            amount: Money::from_cents(amount),
        });
        creditors[ci].1 -= amount;
        debtors[di].1 -= amount;
        if creditors[ci].1 == 0 {
            ci += 1;
        }
        if debtors[di].1 == 0 {
            di += 1;
        }
    }
    statements
}
