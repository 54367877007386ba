// SPDX-License-Identifier: MIT

//! Selects the next printable job from a scanned spool directory (spec
//! §4.6 steps 2-3).

use lpd_core::{JobTicket, QueueFile};
use lpd_storage::SpoolControl;

/// Filter and order `tickets` the way the scheduler would before picking a
/// head job: drop held/removed/moved tickets (spec invariant 4, via
/// [`JobTicket::schedulable`]), drop classes the queue's control file does
/// not accept, then sort by ascending priority letter, ascending job
/// number, and finally filename as a last tie-break.
///
/// Job numbers are assigned in arrival order by the receive handler, so
/// `number` doubles as the "arrival time" ordering key spec §4.6 step 3
/// names; there is no separate arrival timestamp field in the job ticket
/// schema to sort on instead.
pub fn printable_tickets<'a>(tickets: &'a [JobTicket], control: &SpoolControl) -> Vec<&'a JobTicket> {
    let mut printable: Vec<&JobTicket> = tickets
        .iter()
        .filter(|t| t.schedulable())
        .filter(|t| class_accepted(t, control))
        .collect();

    printable.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
    printable
}

fn class_accepted(ticket: &JobTicket, control: &SpoolControl) -> bool {
    if control.classes.is_empty() {
        return true;
    }
    match &ticket.class {
        Some(class) => control.classes.iter().any(|c| c == class),
        None => false,
    }
}

fn sort_key(ticket: &JobTicket) -> (char, u32, String) {
    let filename = QueueFile::job_ticket(ticket.priority.0, ticket.number, ticket.hostname.clone()).filename();
    (ticket.priority.0, ticket.number, filename)
}

/// The head of the printable list, if any (spec §4.6 step 5 "Select head").
pub fn select_head<'a>(tickets: &'a [JobTicket], control: &SpoolControl) -> Option<&'a JobTicket> {
    printable_tickets(tickets, control).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpd_core::{JobTicketConfig, Priority};

    fn ticket(number: u32, priority: char, class: Option<&str>) -> JobTicket {
        let mut t = JobTicket::new(JobTicketConfig {
            identifier: format!("job{number}"),
            number,
            hostname: "host1".to_string(),
            priority: Priority(priority),
            class: class.map(str::to_string),
            logname: "alice".to_string(),
            from_host: "host1".to_string(),
            auth_user: None,
        });
        t.attempt = 0;
        t
    }

    #[test]
    fn orders_by_priority_then_number() {
        let tickets = vec![ticket(2, 'B', None), ticket(1, 'A', None), ticket(3, 'A', None)];
        let control = SpoolControl::default();
        let ordered = printable_tickets(&tickets, &control);
        let numbers: Vec<u32> = ordered.iter().map(|t| t.number).collect();
        assert_eq!(numbers, vec![1, 3, 2]);
    }

    #[test]
    fn held_and_removed_jobs_are_excluded() {
        let mut held = ticket(1, 'A', None);
        held.hold_time = 1000;
        let mut removed = ticket(2, 'A', None);
        removed.remove_time = 2000;
        let printable = ticket(3, 'A', None);
        let tickets = vec![held, removed, printable];
        let control = SpoolControl::default();
        let ordered = printable_tickets(&tickets, &control);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].number, 3);
    }

    #[test]
    fn class_filter_drops_non_matching_jobs() {
        let tickets = vec![ticket(1, 'A', Some("red")), ticket(2, 'A', Some("blue")), ticket(3, 'A', None)];
        let mut control = SpoolControl::default();
        control.classes = vec!["blue".to_string()];
        let ordered = printable_tickets(&tickets, &control);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].number, 2);
    }

    #[test]
    fn select_head_returns_the_first_in_order() {
        let tickets = vec![ticket(2, 'A', None), ticket(1, 'A', None)];
        let control = SpoolControl::default();
        assert_eq!(select_head(&tickets, &control).unwrap().number, 1);
    }
}
