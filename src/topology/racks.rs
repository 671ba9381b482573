use super::model::{DeviceIdx, Priceable, Rack, RackIdx};
use super::planner::PlanContext;
use crate::error::{PlanError, PlanResult};

/// Create the whole rack pool up front, named `rack_1`..`rack_n`.
pub async fn create_racks(ctx: &PlanContext<'_>, count: usize, height: u32) -> PlanResult<Vec<Rack>> {
    let price = ctx.prices.rack_price(height);
    let mut racks = Vec::with_capacity(count);
    for n in 1..=count {
        let name = format!("rack_{}", n);
        let id = ctx
            .inventory
            .create_rack(&name, height, ctx.site_id)
            .await
            .map_err(|e| {
                PlanError::backend(
                    format!("create_rack(name={}, height={}, site={})", name, height, ctx.site_id),
                    e,
                )
            })?;
        racks.push(Rack {
            id,
            priceable: Priceable::new(name.clone(), format!("{}U", height), price),
            name,
            height,
            devices: Vec::new(),
        });
    }
    tracing::info!("Created {} racks of {}U", count, height);
    Ok(racks)
}

/// First rack, in creation order, with a free slot.
pub fn find_free_rack(racks: &[Rack]) -> PlanResult<RackIdx> {
    racks
        .iter()
        .position(Rack::has_room)
        .map(RackIdx)
        .ok_or_else(|| {
            let slots: u32 = racks.iter().map(|r| r.height).sum();
            PlanError::capacity(format!("all {} racks are full ({} slots)", racks.len(), slots))
        })
}

/// Append a device to the rack and return its 1-based slot.
pub fn add_device(rack: &mut Rack, device: DeviceIdx) -> PlanResult<u32> {
    if !rack.has_room() {
        return Err(PlanError::capacity(format!("{} is full ({}U)", rack.name, rack.height)));
    }
    rack.devices.push(device);
    Ok(rack.devices.len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rack(n: usize, height: u32) -> Rack {
        Rack {
            id: n as i64,
            name: format!("rack_{}", n),
            height,
            devices: Vec::new(),
            priceable: Priceable::new(format!("rack_{}", n), format!("{}U", height), 0.0),
        }
    }

    #[test]
    fn test_first_fit_fills_in_creation_order() {
        let mut racks = vec![rack(1, 2), rack(2, 2), rack(3, 2)];
        let mut placed = Vec::new();
        for d in 0..5 {
            let idx = find_free_rack(&racks).unwrap();
            let pos = add_device(&mut racks[idx.0], DeviceIdx(d)).unwrap();
            placed.push((idx.0, pos));
        }
        assert_eq!(placed, vec![(0, 1), (0, 2), (1, 1), (1, 2), (2, 1)]);
        assert_eq!(racks[0].devices, vec![DeviceIdx(0), DeviceIdx(1)]);
        assert!(racks.iter().all(|r| r.devices.len() as u32 <= r.height));
    }

    #[test]
    fn test_exhausted_pool_is_capacity_error() {
        let mut racks = vec![rack(1, 1)];
        add_device(&mut racks[0], DeviceIdx(0)).unwrap();
        let err = find_free_rack(&racks).unwrap_err();
        assert_eq!(err.code(), "CAPACITY");
        assert!(find_free_rack(&[]).is_err());
    }

    #[test]
    fn test_add_device_never_overfills() {
        let mut r = rack(1, 1);
        add_device(&mut r, DeviceIdx(0)).unwrap();
        assert!(add_device(&mut r, DeviceIdx(1)).is_err());
        assert_eq!(r.devices.len(), 1);
    }

    #[test]
    fn test_skips_full_rack_ahead_of_free_one() {
        let mut racks = vec![rack(1, 1), rack(2, 3)];
        add_device(&mut racks[0], DeviceIdx(0)).unwrap();
        assert_eq!(find_free_rack(&racks).unwrap(), RackIdx(1));
    }
}
