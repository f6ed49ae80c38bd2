//! Shop-checkout flow. A purchase is either kept or sent as a gift; the
//! detail steps vary by item kind (tickets and bottles need a name and
//! email, hoodies also a size and shipping address). Saved contact
//! details short-circuit the detail steps when they cover the item.

use uuid::Uuid;

use parlor_shared::errors::{AppError, AppResult, ErrorCode};
use parlor_shared::types::chat::{InlineButton, Keyboard, OutboundMessage};

use crate::flows::engine::{FlowEngine, FlowEvent, FlowState, Step, Transition};
use crate::models::{Contact, ItemKind, NewPurchase, PurchaseDetails, UserStat};
use crate::store::Store;

pub const STATUS_PAID: &str = "paid";
pub const STATUS_AWAITING_DETAILS: &str = "awaiting_details";

const SIZES: [&str; 5] = ["S", "M", "L", "XL", "XXL"];

#[derive(Debug, Clone)]
pub struct CheckoutDraft {
    pub item_id: i32,
    pub item_name: String,
    pub kind: ItemKind,
    pub price: i32,
    pub gift: bool,
    pub recipient_username: Option<String>,
    pub recipient_fills: bool,
    /// Set when a gift recipient is filling details for an already-paid
    /// purchase; finalize then updates that row instead of charging.
    pub claim: Option<Uuid>,
    saved_contact: Option<Contact>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub size: Option<String>,
    pub address: Option<String>,
}

fn contact_covers(contact: &Contact, kind: ItemKind) -> bool {
    let base = contact.full_name.is_some() && contact.email.is_some();
    match kind {
        ItemKind::Ticket | ItemKind::Bottle => base,
        ItemKind::Hoodie => base && contact.size.is_some() && contact.address.is_some(),
    }
}

/// Entry step for detail collection: reuse the saved contact when it
/// covers the item, otherwise start typing.
fn details_entry(draft: &CheckoutDraft) -> Transition {
    match &draft.saved_contact {
        Some(contact) if contact_covers(contact, draft.kind) => Transition::Jump("reuse"),
        _ => Transition::Jump("full_name"),
    }
}

static STEPS: [Step<CheckoutDraft>; 8] = [
    Step {
        name: "mode",
        prompt: |draft| {
            OutboundMessage::text(format!(
                "{} — {} points. For yourself or as a gift?",
                draft.item_name, draft.price
            ))
            .with_keyboard(Keyboard::Inline {
                rows: vec![vec![
                    InlineButton::new("For me", "flow:keep"),
                    InlineButton::new("As a gift", "flow:gift"),
                ]],
            })
        },
        apply: |draft, event| match event {
            FlowEvent::Choice(c) if c == "keep" => {
                draft.gift = false;
                Ok(())
            }
            FlowEvent::Choice(c) if c == "gift" => {
                draft.gift = true;
                Ok(())
            }
            _ => Err("use the buttons".to_string()),
        },
        next: |draft| {
            if draft.gift {
                Transition::Jump("recipient")
            } else {
                details_entry(draft)
            }
        },
    },
    Step {
        name: "recipient",
        prompt: |_| OutboundMessage::text("Who is it for? Send their @username."),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send a username".to_string());
            };
            let username = text.trim().trim_start_matches('@');
            if username.is_empty() || username.chars().count() > 64 {
                return Err("send a username up to 64 characters".to_string());
            }
            draft.recipient_username = Some(username.to_string());
            Ok(())
        },
        next: |_| Transition::Jump("filler"),
    },
    Step {
        name: "filler",
        prompt: |_| {
            OutboundMessage::text("Who fills in the delivery details?").with_keyboard(
                Keyboard::Inline {
                    rows: vec![vec![
                        InlineButton::new("I will", "flow:me"),
                        InlineButton::new("The recipient", "flow:them"),
                    ]],
                },
            )
        },
        apply: |draft, event| match event {
            FlowEvent::Choice(c) if c == "me" => {
                draft.recipient_fills = false;
                Ok(())
            }
            FlowEvent::Choice(c) if c == "them" => {
                draft.recipient_fills = true;
                Ok(())
            }
            _ => Err("use the buttons".to_string()),
        },
        next: |draft| {
            if draft.recipient_fills {
                Transition::Complete
            } else {
                details_entry(draft)
            }
        },
    },
    Step {
        name: "reuse",
        prompt: |draft| {
            let contact = draft.saved_contact.as_ref();
            OutboundMessage::text(format!(
                "Use your saved details? ({}, {})",
                contact.and_then(|c| c.full_name.as_deref()).unwrap_or("?"),
                contact.and_then(|c| c.email.as_deref()).unwrap_or("?"),
            ))
            .with_keyboard(Keyboard::Inline {
                rows: vec![vec![
                    InlineButton::new("Use saved", "flow:use"),
                    InlineButton::new("Enter new", "flow:fresh"),
                ]],
            })
        },
        apply: |draft, event| match event {
            FlowEvent::Choice(c) if c == "use" => {
                let contact = draft
                    .saved_contact
                    .clone()
                    .ok_or("no saved details, enter new ones")?;
                draft.full_name = contact.full_name;
                draft.email = contact.email;
                draft.size = contact.size;
                draft.address = contact.address;
                Ok(())
            }
            FlowEvent::Choice(c) if c == "fresh" => Ok(()),
            _ => Err("use the buttons".to_string()),
        },
        next: |draft| {
            if draft.full_name.is_some() {
                Transition::Complete
            } else {
                Transition::Jump("full_name")
            }
        },
    },
    Step {
        name: "full_name",
        prompt: |_| OutboundMessage::text("Full name (first and last)?"),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send the name as text".to_string());
            };
            let name = text.trim();
            if name.split_whitespace().count() < 2 {
                return Err("send both first and last name".to_string());
            }
            draft.full_name = Some(name.to_string());
            Ok(())
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "email",
        prompt: |_| OutboundMessage::text("Email address?"),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send an email address".to_string());
            };
            let email = text.trim();
            if !email.contains('@') || !email.contains('.') || email.contains(' ') {
                return Err("that does not look like an email address".to_string());
            }
            draft.email = Some(email.to_string());
            Ok(())
        },
        next: |draft| match draft.kind {
            ItemKind::Hoodie => Transition::Advance,
            ItemKind::Ticket | ItemKind::Bottle => Transition::Complete,
        },
    },
    Step {
        name: "size",
        prompt: |_| {
            OutboundMessage::text("Size?").with_keyboard(Keyboard::Inline {
                rows: vec![SIZES
                    .iter()
                    .map(|s| InlineButton::new(*s, format!("flow:{s}")))
                    .collect()],
            })
        },
        apply: |draft, event| {
            let FlowEvent::Choice(choice) = event else {
                return Err("use the buttons".to_string());
            };
            if !SIZES.contains(&choice.as_str()) {
                return Err("use the buttons".to_string());
            }
            draft.size = Some(choice.clone());
            Ok(())
        },
        next: |_| Transition::Advance,
    },
    Step {
        name: "address",
        prompt: |_| OutboundMessage::text("Shipping address?"),
        apply: |draft, event| {
            let FlowEvent::Text(text) = event else {
                return Err("send the address as text".to_string());
            };
            let address = text.trim();
            if address.chars().count() < 5 {
                return Err("that address looks too short".to_string());
            }
            draft.address = Some(address.to_string());
            Ok(())
        },
        next: |_| Transition::Complete,
    },
];

pub static ENGINE: FlowEngine<CheckoutDraft> = FlowEngine::new(&STEPS);

/// Starts a checkout. Fails before any state is created when the item is
/// unknown or the buyer cannot afford it.
pub fn begin(
    store: &dyn Store,
    buyer: i64,
    item_id: i32,
) -> AppResult<(FlowState<CheckoutDraft>, OutboundMessage)> {
    let item = store
        .get_shop_item(item_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound, "no such item"))?;
    let kind = ItemKind::parse(&item.kind)
        .ok_or_else(|| AppError::internal(format!("bad stored item kind: {}", item.kind)))?;
    let balance = store.balance(buyer)?;
    if balance < item.price {
        return Err(AppError::insufficient_funds(format!(
            "{} costs {} points, you have {balance}",
            item.name, item.price
        )));
    }
    let draft = CheckoutDraft {
        item_id: item.id,
        item_name: item.name,
        kind,
        price: item.price,
        gift: false,
        recipient_username: None,
        recipient_fills: false,
        claim: None,
        saved_contact: store.get_contact(buyer)?,
        full_name: None,
        email: None,
        size: None,
        address: None,
    };
    Ok(ENGINE.start(draft))
}

/// Starts the detail-filling flow for a gift addressed to this user.
pub fn begin_claim(
    store: &dyn Store,
    user_id: i64,
    username: Option<&str>,
    purchase_id: Uuid,
) -> AppResult<(FlowState<CheckoutDraft>, OutboundMessage)> {
    let purchase = store
        .get_purchase(purchase_id)?
        .ok_or_else(|| AppError::new(ErrorCode::PurchaseNotFound, "no such purchase"))?;
    let addressed_by_id = purchase.recipient_id == Some(user_id);
    let addressed_by_name =
        username.is_some() && purchase.recipient_username.as_deref() == username;
    if !addressed_by_id && !addressed_by_name {
        return Err(AppError::new(
            ErrorCode::NotGiftRecipient,
            "this gift is addressed to someone else",
        ));
    }
    if purchase.parsed_details() != Some(PurchaseDetails::Pending) {
        return Err(AppError::bad_request("details are already filled in"));
    }
    let item = store
        .get_shop_item(purchase.item_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound, "no such item"))?;
    let kind = ItemKind::parse(&item.kind)
        .ok_or_else(|| AppError::internal(format!("bad stored item kind: {}", item.kind)))?;

    let draft = CheckoutDraft {
        item_id: item.id,
        item_name: item.name,
        kind,
        price: item.price,
        gift: false,
        recipient_username: None,
        recipient_fills: false,
        claim: Some(purchase_id),
        saved_contact: store.get_contact(user_id)?,
        full_name: None,
        email: None,
        size: None,
        address: None,
    };
    let entry = match details_entry(&draft) {
        Transition::Jump(step) => step,
        _ => "full_name",
    };
    ENGINE.start_at(draft, entry)
}

#[derive(Debug, Clone)]
pub struct Receipt {
    pub purchase_id: Uuid,
    pub item_name: String,
    /// Buyer's balance after the debit; absent when a recipient only
    /// filled in details.
    pub balance: Option<i32>,
    pub awaiting_recipient: bool,
}

fn build_details(draft: &CheckoutDraft) -> AppResult<PurchaseDetails> {
    let full_name = draft
        .full_name
        .clone()
        .ok_or_else(|| AppError::internal("checkout finished without a name"))?;
    let email = draft
        .email
        .clone()
        .ok_or_else(|| AppError::internal("checkout finished without an email"))?;
    Ok(match draft.kind {
        ItemKind::Ticket => PurchaseDetails::Ticket { full_name, email },
        ItemKind::Bottle => PurchaseDetails::Bottle { full_name, email },
        ItemKind::Hoodie => PurchaseDetails::Hoodie {
            full_name,
            email,
            size: draft
                .size
                .clone()
                .ok_or_else(|| AppError::internal("hoodie checkout without a size"))?,
            address: draft
                .address
                .clone()
                .ok_or_else(|| AppError::internal("hoodie checkout without an address"))?,
        },
    })
}

fn save_contact(store: &dyn Store, user_id: i64, draft: &CheckoutDraft) -> AppResult<()> {
    store.upsert_contact(&Contact {
        user_id,
        full_name: draft.full_name.clone(),
        email: draft.email.clone(),
        address: draft.address.clone(),
        size: draft.size.clone(),
    })
}

/// Commits the finished draft. The wallet is re-checked and debited here,
/// in the same call that writes the purchase row; a rejected balance
/// leaves no row behind.
pub fn finalize(store: &dyn Store, user_id: i64, draft: &CheckoutDraft) -> AppResult<Receipt> {
    if let Some(purchase_id) = draft.claim {
        let details = build_details(draft)?;
        store.update_purchase_details(
            purchase_id,
            &serde_json::to_value(&details)
                .map_err(|e| AppError::internal(format!("serialize details: {e}")))?,
        )?;
        store.update_purchase_status(purchase_id, STATUS_PAID)?;
        save_contact(store, user_id, draft)?;
        tracing::info!(user_id, %purchase_id, "gift details filled in");
        return Ok(Receipt {
            purchase_id,
            item_name: draft.item_name.clone(),
            balance: None,
            awaiting_recipient: false,
        });
    }

    let balance = store.balance(user_id)?;
    if balance < draft.price {
        return Err(AppError::insufficient_funds(format!(
            "{} costs {} points, you have {balance}",
            draft.item_name, draft.price
        )));
    }

    let details = if draft.recipient_fills {
        PurchaseDetails::Pending
    } else {
        build_details(draft)?
    };
    let recipient_id = match draft.recipient_username.as_deref() {
        Some(username) => store.find_user_by_username(username)?,
        None => None,
    };
    let purchase_id = Uuid::new_v4();
    let status = if draft.recipient_fills {
        STATUS_AWAITING_DETAILS
    } else {
        STATUS_PAID
    };

    let new_balance = store.adjust_balance(user_id, -draft.price)?;
    store.create_purchase(&NewPurchase {
        id: purchase_id,
        buyer_id: user_id,
        item_id: draft.item_id,
        recipient_id,
        recipient_username: draft.recipient_username.clone(),
        details: serde_json::to_value(&details)
            .map_err(|e| AppError::internal(format!("serialize details: {e}")))?,
        status: status.to_string(),
    })?;
    store.increment_stat(user_id, UserStat::Purchases, 1)?;
    if !draft.gift {
        save_contact(store, user_id, draft)?;
    }
    tracing::info!(
        user_id,
        %purchase_id,
        item = %draft.item_name,
        gift = draft.gift,
        "purchase completed"
    );
    Ok(Receipt {
        purchase_id,
        item_name: draft.item_name.clone(),
        balance: Some(new_balance),
        awaiting_recipient: draft.recipient_fills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::engine::Advance;
    use crate::store::memory::MemoryStore;

    fn seeded_store(balance: i32) -> MemoryStore {
        let store = MemoryStore::new(balance);
        store
            .ensure_shop_item("ticket", "Party ticket", ItemKind::Ticket, 15)
            .unwrap();
        store
            .ensure_shop_item("hoodie", "Club hoodie", ItemKind::Hoodie, 50)
            .unwrap();
        store
    }

    #[test]
    fn ticket_checkout_debits_and_saves_the_contact() {
        let store = seeded_store(100);
        let (mut state, _) = begin(&store, 1, 1).unwrap();

        ENGINE.handle(&mut state, &FlowEvent::Choice("keep".into())).unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("Ivan Petrov".into()))
            .unwrap();
        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Text("ivan@example.com".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Complete));

        let receipt = finalize(&store, 1, &state.draft).unwrap();
        assert_eq!(receipt.balance, Some(85));
        let purchase = store.get_purchase(receipt.purchase_id).unwrap().unwrap();
        assert_eq!(purchase.status, STATUS_PAID);
        assert_eq!(
            purchase.parsed_details(),
            Some(PurchaseDetails::Ticket {
                full_name: "Ivan Petrov".into(),
                email: "ivan@example.com".into(),
            })
        );
        let contact = store.get_contact(1).unwrap().unwrap();
        assert_eq!(contact.email.as_deref(), Some("ivan@example.com"));
        assert_eq!(store.get_user(1).unwrap().unwrap().purchases, 1);
    }

    #[test]
    fn hoodie_checkout_collects_size_and_address() {
        let store = seeded_store(100);
        let (mut state, _) = begin(&store, 1, 2).unwrap();

        ENGINE.handle(&mut state, &FlowEvent::Choice("keep".into())).unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("Ivan Petrov".into()))
            .unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("ivan@example.com".into()))
            .unwrap();
        assert_eq!(state.current_step(&ENGINE), "size");
        ENGINE.handle(&mut state, &FlowEvent::Choice("L".into())).unwrap();
        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Text("Arbat 1, Moscow".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Complete));

        let receipt = finalize(&store, 1, &state.draft).unwrap();
        let purchase = store.get_purchase(receipt.purchase_id).unwrap().unwrap();
        assert!(matches!(
            purchase.parsed_details(),
            Some(PurchaseDetails::Hoodie { .. })
        ));
    }

    #[test]
    fn begin_rejects_an_unaffordable_item_without_mutation() {
        let store = seeded_store(10);
        let err = begin(&store, 1, 1).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);
        assert_eq!(store.balance(1).unwrap(), 10);
    }

    #[test]
    fn finalize_rechecks_the_balance() {
        let store = seeded_store(15);
        let (mut state, _) = begin(&store, 1, 1).unwrap();
        ENGINE.handle(&mut state, &FlowEvent::Choice("keep".into())).unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("Ivan Petrov".into()))
            .unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("ivan@example.com".into()))
            .unwrap();

        // Balance spent elsewhere while the flow was open.
        store.adjust_balance(1, -10).unwrap();
        let err = finalize(&store, 1, &state.draft).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);
        assert_eq!(store.balance(1).unwrap(), 5);
        assert_eq!(store.get_user(1).unwrap().map(|u| u.purchases), None);
    }

    #[test]
    fn gift_with_recipient_details_lands_in_their_inbox() {
        let store = seeded_store(100);
        let (mut state, _) = begin(&store, 1, 1).unwrap();

        ENGINE.handle(&mut state, &FlowEvent::Choice("gift".into())).unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("@masha".into()))
            .unwrap();
        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Choice("them".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Complete));

        let receipt = finalize(&store, 1, &state.draft).unwrap();
        assert!(receipt.awaiting_recipient);
        let purchase = store.get_purchase(receipt.purchase_id).unwrap().unwrap();
        assert_eq!(purchase.status, STATUS_AWAITING_DETAILS);
        assert_eq!(purchase.parsed_details(), Some(PurchaseDetails::Pending));

        let inbox = store.pending_gifts_for(99, Some("masha")).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].id, receipt.purchase_id);
    }

    #[test]
    fn recipient_claim_fills_details_without_charging_them() {
        let store = seeded_store(100);
        let (mut state, _) = begin(&store, 1, 1).unwrap();
        ENGINE.handle(&mut state, &FlowEvent::Choice("gift".into())).unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("masha".into()))
            .unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Choice("them".into()))
            .unwrap();
        let receipt = finalize(&store, 1, &state.draft).unwrap();

        let (mut claim, _) =
            begin_claim(&store, 2, Some("masha"), receipt.purchase_id).unwrap();
        ENGINE
            .handle(&mut claim, &FlowEvent::Text("Masha Ivanova".into()))
            .unwrap();
        let outcome = ENGINE
            .handle(&mut claim, &FlowEvent::Text("masha@example.com".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Complete));

        let claim_receipt = finalize(&store, 2, &claim.draft).unwrap();
        assert_eq!(claim_receipt.balance, None);
        let purchase = store.get_purchase(receipt.purchase_id).unwrap().unwrap();
        assert_eq!(purchase.status, STATUS_PAID);
        assert!(matches!(
            purchase.parsed_details(),
            Some(PurchaseDetails::Ticket { .. })
        ));
        // Recipient balance untouched, buyer paid at purchase time.
        assert_eq!(store.balance(2).unwrap(), 100);
    }

    #[test]
    fn strangers_cannot_claim_a_gift() {
        let store = seeded_store(100);
        let (mut state, _) = begin(&store, 1, 1).unwrap();
        ENGINE.handle(&mut state, &FlowEvent::Choice("gift".into())).unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Text("masha".into()))
            .unwrap();
        ENGINE
            .handle(&mut state, &FlowEvent::Choice("them".into()))
            .unwrap();
        let receipt = finalize(&store, 1, &state.draft).unwrap();

        let err = begin_claim(&store, 3, Some("oleg"), receipt.purchase_id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotGiftRecipient);
    }

    #[test]
    fn saved_contact_short_circuits_the_detail_steps() {
        let store = seeded_store(100);
        store
            .upsert_contact(&Contact {
                user_id: 1,
                full_name: Some("Ivan Petrov".into()),
                email: Some("ivan@example.com".into()),
                address: None,
                size: None,
            })
            .unwrap();

        let (mut state, _) = begin(&store, 1, 1).unwrap();
        ENGINE.handle(&mut state, &FlowEvent::Choice("keep".into())).unwrap();
        assert_eq!(state.current_step(&ENGINE), "reuse");
        let outcome = ENGINE
            .handle(&mut state, &FlowEvent::Choice("use".into()))
            .unwrap();
        assert!(matches!(outcome, Advance::Complete));
        assert_eq!(state.draft.email.as_deref(), Some("ivan@example.com"));
    }

    #[test]
    fn incomplete_saved_contact_does_not_cover_a_hoodie() {
        let store = seeded_store(100);
        store
            .upsert_contact(&Contact {
                user_id: 1,
                full_name: Some("Ivan Petrov".into()),
                email: Some("ivan@example.com".into()),
                address: None,
                size: None,
            })
            .unwrap();

        let (mut state, _) = begin(&store, 1, 2).unwrap();
        ENGINE.handle(&mut state, &FlowEvent::Choice("keep".into())).unwrap();
        assert_eq!(state.current_step(&ENGINE), "full_name");
    }
}
