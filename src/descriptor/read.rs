//! State machine producing the unnamed items of a read descriptor.

use super::{DataItem, ItemType, Token};
use crate::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum State {
    #[default]
    Initial,
    /// After a type keyword or callback.
    Type,
    /// After a struct reference.
    Name,
    FixedLength,
    ArraySize,
}

#[derive(Debug)]
pub(super) struct ReadParser {
    items: Vec<DataItem>,
    current: DataItem,
    state: State,
}

impl Default for ReadParser {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: DataItem::new(ItemType::Void),
            state: State::Initial,
        }
    }
}

impl ReadParser {
    pub(super) fn advance(&mut self, token: Token) -> Result<(), Error> {
        match token {
            Token::Type(ty) => self.start(ty, State::Type)?,
            Token::Function(name) => self.start(ItemType::Function(name.into()), State::Type)?,
            Token::Ident(name) => self.start(ItemType::Custom(name.into()), State::Name)?,

            Token::FixedLength(size)
                if self.state == State::Type && self.current.ty.takes_length() =>
            {
                self.current.size = size;
                self.state = State::FixedLength;
            }

            Token::ArraySize(count)
                if matches!(self.state, State::Type | State::FixedLength | State::Name) =>
            {
                self.current.count = count;
                self.state = State::ArraySize;
            }

            token => Err(Error::UnexpectedToken(token.to_string()))?,
        }

        Ok(())
    }

    /// Complete the pending item, if any, and return all items.
    pub(super) fn finish(mut self) -> Result<Vec<DataItem>, Error> {
        self.complete()?;
        Ok(self.items)
    }

    fn start(&mut self, ty: ItemType, state: State) -> Result<(), Error> {
        self.complete()?;
        self.current = DataItem::new(ty);
        self.state = state;
        Ok(())
    }

    fn complete(&mut self) -> Result<(), Error> {
        if self.state == State::Initial {
            return Ok(());
        }

        if self.current.ty == ItemType::Void && self.current.size == 0 {
            Err(Error::VoidWithoutLength)?;
        }

        let item = core::mem::replace(&mut self.current, DataItem::new(ItemType::Void));
        self.items.push(item);
        self.state = State::Initial;

        Ok(())
    }
}
