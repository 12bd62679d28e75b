#![no_main]

use kubecis::controls::{Check, Group};
use kubecis::filter::{FilterOpts, RunFilter};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // First half is the group list, second half the check list
        let split = input.len() / 2;
        let (groups, checks) = match (input.get(..split), input.get(split..)) {
            (Some(g), Some(c)) => (g, c),
            _ => (input, ""),
        };

        let opts = FilterOpts {
            group_list: FilterOpts::parse_list(groups),
            check_list: FilterOpts::parse_list(checks),
            ..FilterOpts::default()
        };

        // Compilation fails only when both lists are non-empty
        match RunFilter::compile(&opts) {
            Ok(filter) => {
                let group = Group { id: groups.to_string(), ..Group::default() };
                let check = Check { id: checks.to_string(), ..Check::default() };
                let _ = filter.matches(&group, &check);
            }
            Err(_) => assert!(!opts.group_list.is_empty() && !opts.check_list.is_empty()),
        }
    }
});
