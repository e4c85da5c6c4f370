use serenity::all::RoleId;

use crate::{constant, store::TicketId};

/// An interactive control attached to a panel or ticket message.
///
/// All the state a control needs lives in its custom id, so buttons posted
/// before a restart keep working afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Verify { role_id: RoleId },
    CreateTicket { support_role_id: Option<RoleId> },
    CloseTicket { ticket_id: TicketId },
}

impl Control {
    pub fn custom_id(&self) -> String {
        match self {
            Control::Verify { role_id } => format!("{}:{role_id}", constant::controls::VERIFY),
            Control::CreateTicket {
                support_role_id: Some(role_id),
            } => format!("{}:{role_id}", constant::controls::CREATE_TICKET),
            Control::CreateTicket {
                support_role_id: None,
            } => format!(
                "{}:{}",
                constant::controls::CREATE_TICKET,
                constant::controls::NO_ROLE
            ),
            Control::CloseTicket { ticket_id } => {
                format!("{}:{ticket_id}", constant::controls::CLOSE_TICKET)
            }
        }
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let (kind, value) = custom_id.split_once(':')?;
        match kind {
            constant::controls::VERIFY => Some(Control::Verify {
                role_id: parse_role(value)?,
            }),
            constant::controls::CREATE_TICKET => Some(Control::CreateTicket {
                support_role_id: match value {
                    constant::controls::NO_ROLE => None,
                    value => Some(parse_role(value)?),
                },
            }),
            constant::controls::CLOSE_TICKET => Some(Control::CloseTicket {
                ticket_id: value.parse().ok()?,
            }),
            _ => None,
        }
    }
}

fn parse_role(value: &str) -> Option<RoleId> {
    value
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(RoleId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_ids_carry_their_parameters() {
        let controls = [
            Control::Verify {
                role_id: RoleId::new(42),
            },
            Control::CreateTicket {
                support_role_id: Some(RoleId::new(7)),
            },
            Control::CreateTicket {
                support_role_id: None,
            },
            Control::CloseTicket { ticket_id: 12 },
        ];
        let ids: Vec<_> = controls.iter().map(Control::custom_id).collect();
        assert_eq!(
            ids,
            [
                "verify:42",
                "create_ticket:7",
                "create_ticket:none",
                "close_ticket:12"
            ]
        );
        for (control, id) in controls.iter().zip(&ids) {
            assert_eq!(Control::parse(id).as_ref(), Some(control));
        }
    }

    #[test]
    fn rejects_foreign_or_malformed_ids() {
        assert_eq!(Control::parse("verify_button"), None);
        assert_eq!(Control::parse("verify:"), None);
        assert_eq!(Control::parse("verify:0"), None);
        assert_eq!(Control::parse("close_ticket:abc"), None);
        assert_eq!(Control::parse("close_ticket:-1"), None);
        assert_eq!(Control::parse("cancel:1:2"), None);
    }
}
