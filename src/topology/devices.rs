use super::model::{Device, DeviceIdx, Fabric, Interface, Priceable, Tier};
use super::planner::PlanContext;
use super::racks::{add_device, find_free_rack};
use crate::error::{PlanError, PlanResult};
use crate::inventory::NewDevice;

/// Create `count` devices of a tier with `ports` interfaces each, placing every
/// device in the first rack with room. Returns the tier's devices in creation
/// order.
pub async fn create_tier(
    ctx: &PlanContext<'_>,
    fabric: &mut Fabric,
    tier: Tier,
    count: usize,
    ports: usize,
) -> PlanResult<Vec<DeviceIdx>> {
    let model = ctx.models.for_tier(tier);
    let price = ctx.prices.device(model)?;
    let type_id = ctx.device_type(tier)?;
    let role_id = ctx.role(tier)?;

    for n in 0..count {
        let name = tier.device_name(n);
        let rack_idx = find_free_rack(&fabric.racks)?;
        let rack = &fabric.racks[rack_idx.0];
        let position = rack.devices.len() as u32 + 1;

        let request = NewDevice {
            name: name.clone(),
            type_id,
            role_id,
            site_id: ctx.site_id,
            rack_id: Some(rack.id),
            position: Some(position),
        };
        let id = ctx.inventory.create_device(&request).await.map_err(|e| {
            PlanError::backend(
                format!("create_device(name={}, rack={}, position={})", name, rack.name, position),
                e,
            )
        })?;

        let mut interfaces = Vec::with_capacity(ports);
        for i in 1..=ports {
            let if_name = format!("{}int{}", name, i);
            let if_id = ctx
                .inventory
                .create_interface(&if_name, id)
                .await
                .map_err(|e| PlanError::backend(format!("create_interface(name={}, device={})", if_name, id), e))?;
            interfaces.push(Interface {
                id: if_id,
                name: if_name,
                is_open: true,
            });
        }

        let idx = DeviceIdx(fabric.devices.len());
        let slot = add_device(&mut fabric.racks[rack_idx.0], idx)?;
        fabric.devices.push(Device {
            id,
            priceable: Priceable::new(name.clone(), model, price),
            name,
            tier,
            model: model.to_string(),
            interfaces,
            rack: rack_idx,
            position: slot,
        });
        fabric.tier_mut(tier).push(idx);
    }

    tracing::info!("Created {} {} devices with {} ports each", count, tier, ports);
    Ok(fabric.tier(tier).to_vec())
}
