use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;

use crate::interfaces::error::DecodeError;
use crate::interfaces::event::{
    CancelEvent, IOrderBook, MakeEvent, MatchEvent, OrderbookEvent,
};
use crate::interfaces::order::{Order, SaleKind, Side};

/// Decodes one order-book log, dispatching on topic0.
pub fn decode_log(log: &Log) -> Result<OrderbookEvent, DecodeError> {
    let topic0 = *log.topic0().ok_or(DecodeError::MissingTopic)?;
    let block_number = log.block_number.ok_or(DecodeError::MissingBlockNumber)?;
    let data = &log.inner.data;

    if topic0 == IOrderBook::LogMake::SIGNATURE_HASH {
        let ev = IOrderBook::LogMake::decode_log_data(data).map_err(abi)?;
        Ok(OrderbookEvent::Make(MakeEvent {
            order_key: ev.orderKey,
            maker: ev.maker,
            side: Side::try_from(ev.side)?,
            sale_kind: SaleKind::try_from(ev.saleKind)?,
            block_number,
        }))
    } else if topic0 == IOrderBook::LogCancel::SIGNATURE_HASH {
        let ev = IOrderBook::LogCancel::decode_log_data(data).map_err(abi)?;
        Ok(OrderbookEvent::Cancel(CancelEvent {
            order_key: ev.orderKey,
            maker: ev.maker,
            block_number,
        }))
    } else if topic0 == IOrderBook::LogMatch::SIGNATURE_HASH {
        let ev = IOrderBook::LogMatch::decode_log_data(data).map_err(abi)?;
        Ok(OrderbookEvent::Match(MatchEvent {
            make_order_key: ev.makeOrderKey,
            take_order_key: ev.takeOrderKey,
            make_order: Order::try_from(&ev.makeOrder)?,
            take_order: Order::try_from(&ev.takeOrder)?,
            fill_price: ev.fillPrice,
            block_number,
        }))
    } else {
        Err(DecodeError::UnknownSignature(topic0))
    }
}

fn abi(e: alloy::sol_types::Error) -> DecodeError {
    DecodeError::Abi(e.to_string())
}
