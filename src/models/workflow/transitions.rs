use super::types::StatusType;
use StatusType::*;

/// Status types reachable in one step from `from`.
pub fn allowed_transitions(from: StatusType) -> &'static [StatusType] {
    match from {
        Available => &[Booked, Reserved, Allotted, Pending, OnHold],
        Booked => &[Allotted, Contracted, Cancelled, OnHold],
        Reserved => &[Booked, Allotted, Cancelled, OnHold, Available],
        Allotted => &[Contracted, Sold, Cancelled, OnHold],
        Contracted => &[Sold, Cancelled, OnHold],
        Cancelled => &[Available, Closed],
        OnHold => &[Available, Booked, Reserved, Allotted, Cancelled],
        Sold => &[Closed],
        Pending => &[Available, Booked, Reserved, Cancelled],
        Closed => &[],
    }
}

pub fn can_transition(from: StatusType, to: StatusType) -> bool {
    allowed_transitions(from).contains(&to)
}

pub fn is_terminal(status_type: StatusType) -> bool {
    allowed_transitions(status_type).is_empty()
}
