//! State machine producing the named fields of a struct declaration.

use super::{DataItem, Field, ItemType, Token};
use crate::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Initial,
    Type,
    FixedLength,
    ArraySize,
    Colon,
}

#[derive(Debug)]
pub(super) struct FieldsParser {
    fields: Vec<Field>,
    current: DataItem,
    state: State,
}

impl Default for FieldsParser {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            current: DataItem::new(ItemType::Void),
            state: State::Initial,
        }
    }
}

impl FieldsParser {
    pub(super) fn advance(&mut self, token: Token) -> Result<(), Error> {
        match token {
            Token::Ident(name) if self.state == State::Colon => self.complete(Some(name))?,

            Token::Type(ty) => self.start(ty)?,
            Token::Ident(name) => self.start(ItemType::Custom(name.into()))?,
            Token::Function(name) => self.start(ItemType::Function(name.into()))?,

            Token::FixedLength(size)
                if self.state == State::Type && self.current.ty.takes_length() =>
            {
                self.current.size = size;
                self.state = State::FixedLength;
            }

            Token::ArraySize(count) if matches!(self.state, State::Type | State::FixedLength) => {
                self.current.count = count;
                self.state = State::ArraySize;
            }

            // A void field is anonymous.
            Token::Colon
                if matches!(self.state, State::Type | State::FixedLength | State::ArraySize)
                    && self.current.ty != ItemType::Void =>
            {
                self.state = State::Colon;
            }

            token => Err(Error::UnexpectedToken(token.to_string()))?,
        }

        Ok(())
    }

    /// Complete a pending anonymous field, if any, and return all fields.
    pub(super) fn finish(mut self) -> Result<Vec<Field>, Error> {
        self.flush()?;
        Ok(self.fields)
    }

    fn start(&mut self, ty: ItemType) -> Result<(), Error> {
        self.flush()?;
        self.current = DataItem::new(ty);
        self.state = State::Type;
        Ok(())
    }

    /// Complete a pending `void` field before a new field begins. Any other
    /// pending field is still waiting for its name.
    fn flush(&mut self) -> Result<(), Error> {
        match self.state {
            State::Initial => Ok(()),
            _ if self.current.ty == ItemType::Void => self.complete(None),
            _ => Err(Error::Unfinished),
        }
    }

    fn complete(&mut self, name: Option<&str>) -> Result<(), Error> {
        if self.current.ty == ItemType::Void && self.current.size == 0 {
            Err(Error::VoidWithoutLength)?;
        }

        if let Some(name) = name {
            if self.fields.iter().any(|field| field.name.as_deref() == Some(name)) {
                Err(Error::DuplicateField(name.to_string()))?;
            }
        }

        let item = core::mem::replace(&mut self.current, DataItem::new(ItemType::Void));
        self.fields.push(Field {
            item,
            name: name.map(str::to_string),
        });
        self.state = State::Initial;

        Ok(())
    }
}
