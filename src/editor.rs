// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Create/edit form for a single transaction.
//!
//! `idle -> creating | editing -> idle`. Submitting is split into
//! [`TransactionEditor::begin_submit`] and [`TransactionEditor::finish_submit`]
//! so the saving flag covers the whole in-flight request.

use chrono::NaiveDate;

use crate::dashboard::{Dashboard, Notice};
use crate::error::Result;
use crate::models::{NewTransaction, Transaction, TransactionKind, CATEGORIES};
use crate::remote::TransactionStore;
use crate::utils::{amount_string, parse_amount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorForm {
    pub amount: String,
    pub label: String,
    pub kind: TransactionKind,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorState {
    Idle,
    Creating(EditorForm),
    Editing {
        original: Transaction,
        form: EditorForm,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitRequest {
    Create(NewTransaction),
    Update(Transaction),
}

#[derive(Debug)]
pub struct TransactionEditor {
    state: EditorState,
    saving: bool,
}

impl Default for TransactionEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionEditor {
    pub fn new() -> Self {
        TransactionEditor {
            state: EditorState::Idle,
            saving: false,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn form(&self) -> Option<&EditorForm> {
        match &self.state {
            EditorState::Idle => None,
            EditorState::Creating(form) | EditorState::Editing { form, .. } => Some(form),
        }
    }

    fn form_mut(&mut self) -> Option<&mut EditorForm> {
        if self.saving {
            return None;
        }
        match &mut self.state {
            EditorState::Idle => None,
            EditorState::Creating(form) | EditorState::Editing { form, .. } => Some(form),
        }
    }

    /// Blank form: expense, dated `today`.
    pub fn open_create(&mut self, today: NaiveDate) {
        if self.saving {
            return;
        }
        self.state = EditorState::Creating(EditorForm {
            amount: String::new(),
            label: String::new(),
            kind: TransactionKind::Expense,
            date: today,
        });
    }

    /// Pre-filled from `tx`; the date is carried over and not editable.
    pub fn open_edit(&mut self, tx: &Transaction) {
        if self.saving {
            return;
        }
        self.state = EditorState::Editing {
            form: EditorForm {
                amount: amount_string(&tx.amount),
                label: tx.label.clone(),
                kind: tx.kind,
                date: tx.date,
            },
            original: tx.clone(),
        };
    }

    pub fn close(&mut self) {
        if !self.saving {
            self.state = EditorState::Idle;
        }
    }

    pub fn set_amount(&mut self, amount: &str) {
        if let Some(form) = self.form_mut() {
            form.amount = amount.to_string();
        }
    }

    pub fn set_label(&mut self, label: &str) {
        if let Some(form) = self.form_mut() {
            form.label = label.to_string();
        }
    }

    pub fn set_kind(&mut self, kind: TransactionKind) {
        if let Some(form) = self.form_mut() {
            form.kind = kind;
        }
    }

    /// Quick-select by position in [`CATEGORIES`]; false if out of range.
    pub fn pick_category(&mut self, index: usize) -> bool {
        match CATEGORIES.get(index) {
            Some(label) => {
                self.set_label(label);
                self.form().is_some()
            }
            None => false,
        }
    }

    /// Positive amount and a non-blank label, nothing in flight.
    pub fn can_submit(&self) -> bool {
        !self.saving
            && self
                .form()
                .is_some_and(|f| parse_amount(&f.amount).is_ok() && !f.label.trim().is_empty())
    }

    /// `None` (inert) when the form cannot be submitted.
    pub fn begin_submit(&mut self) -> Option<SubmitRequest> {
        if !self.can_submit() {
            return None;
        }
        let request = match &self.state {
            EditorState::Idle => return None,
            EditorState::Creating(form) => SubmitRequest::Create(NewTransaction {
                amount: parse_amount(&form.amount).ok()?,
                label: form.label.trim().to_string(),
                date: form.date,
                kind: form.kind,
            }),
            EditorState::Editing { original, form } => SubmitRequest::Update(Transaction {
                amount: parse_amount(&form.amount).ok()?,
                label: form.label.trim().to_string(),
                kind: form.kind,
                ..original.clone()
            }),
        };
        self.saving = true;
        Some(request)
    }

    /// Merges a confirmed result into the list; a failure leaves it
    /// untouched. Either way the editor returns to idle.
    pub fn finish_submit(
        &mut self,
        result: Result<Transaction>,
        dashboard: &mut Dashboard,
    ) -> Notice {
        let editing = matches!(self.state, EditorState::Editing { .. });
        self.saving = false;
        self.state = EditorState::Idle;
        match (result, editing) {
            (Ok(tx), true) => {
                if dashboard.apply_updated(tx) {
                    Notice::success("Transaction updated")
                } else {
                    Notice::error("Updated transaction is no longer in the list")
                }
            }
            (Ok(tx), false) => {
                dashboard.apply_created(tx);
                Notice::success("Transaction added")
            }
            (Err(e), true) => Notice::error(format!("Could not update: {}", e)),
            (Err(e), false) => Notice::error(format!("Could not save: {}", e)),
        }
    }

    pub fn submit<S: TransactionStore + ?Sized>(
        &mut self,
        store: &S,
        dashboard: &mut Dashboard,
    ) -> Option<Notice> {
        let request = self.begin_submit()?;
        let result = match request {
            SubmitRequest::Create(new_tx) => store.insert(&new_tx),
            SubmitRequest::Update(tx) => store.update(&tx).map(|_| tx),
        };
        Some(self.finish_submit(result, dashboard))
    }
}
