use bevy::ecs::message::{Message, MessageReader, MessageWriter};
use bevy::prelude::*;

use crate::bus::{Notification, NotificationBus};
use crate::model::{FleetId, GalaxyView, Order, OrderSink};
use crate::panel::GalaxyGridPanel;
use crate::plugins::core::{EventLog, GameState, InputBindings};
use crate::snapshot::GalaxySnapshot;

pub struct OrdersPlugin;

impl Plugin for OrdersPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<OrderAppliedEvent>()
            .init_resource::<OrderQueue>()
            .init_resource::<NotificationBus>()
            .add_systems(
                Update,
                (handle_ship_orders, apply_orders, log_applied_orders)
                    .chain()
                    .run_if(in_state(GameState::InGame)),
            );
    }
}

#[derive(Message)]
pub struct OrderAppliedEvent {
    pub label: String,
}

/// Orders submitted by the grid, applied to the galaxy once per frame.
#[derive(Resource, Default)]
pub struct OrderQueue {
    pub pending: Vec<Order>,
}

impl OrderSink for OrderQueue {
    fn submit(&mut self, order: Order) {
        info!("Order queued: {}", order.label());
        self.pending.push(order);
    }
}

/// The fleet a ship order applies to: the selected fleet, else the first
/// viewer fleet in the selected sector.
fn ship_order_target(panel: &GalaxyGridPanel, galaxy: &GalaxySnapshot) -> Option<FleetId> {
    if let Some(fleet) = panel.selected_fleet() {
        return Some(fleet);
    }
    let sector = panel.selected_sector()?;
    galaxy
        .fleets()
        .into_iter()
        .find(|fleet| fleet.location == sector && fleet.owner == galaxy.viewer)
        .map(|fleet| fleet.id)
}

fn handle_ship_orders(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    panel: Option<Res<GalaxyGridPanel>>,
    galaxy: Res<GalaxySnapshot>,
    mut queue: ResMut<OrderQueue>,
    mut log: ResMut<EventLog>,
) {
    let scrap = input.just_pressed(bindings.scrap_ship);
    let redeploy = input.just_pressed(bindings.redeploy_ship);
    if !scrap && !redeploy {
        return;
    }
    let Some(panel) = panel else {
        return;
    };

    let Some(fleet) = ship_order_target(&panel, &galaxy) else {
        log.push("No fleet selected".to_string());
        return;
    };
    if scrap {
        queue.submit(Order::ScrapShip { fleet });
    }
    if redeploy {
        queue.submit(Order::RedeployShip { fleet });
    }
}

fn apply_orders(
    mut queue: ResMut<OrderQueue>,
    mut galaxy: ResMut<GalaxySnapshot>,
    mut bus: ResMut<NotificationBus>,
    mut log: ResMut<EventLog>,
    mut applied: MessageWriter<OrderAppliedEvent>,
) {
    if queue.pending.is_empty() {
        return;
    }

    let mut changed = false;
    for order in queue.pending.drain(..) {
        match galaxy.apply_order(&order) {
            Ok(line) => {
                changed = true;
                applied.write(OrderAppliedEvent { label: line });
            }
            Err(error) => {
                warn!("Order rejected: {}", error);
                log.push(format!("Order rejected: {}", error));
            }
        }
    }

    if changed {
        bus.publish(Notification::ScreenRefreshRequired);
    }
}

fn log_applied_orders(mut applied: MessageReader<OrderAppliedEvent>, mut log: ResMut<EventLog>) {
    for event in applied.read() {
        info!("Order applied: {}", event.label);
        log.push(event.label.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::NotificationKind;
    use crate::civs::CivId;
    use crate::grid::MapLocation;
    use crate::snapshot::{test_civs, test_fleet};
    use bevy::ecs::message::Messages;
    use bevy::ecs::system::SystemState;

    fn world_with_fleet() -> World {
        let mut world = World::default();
        let mut galaxy = GalaxySnapshot::new(8, 8, test_civs());
        galaxy.add_fleet(test_fleet(1, CivId(1), MapLocation::new(2, 2)));
        world.insert_resource(galaxy);
        world.insert_resource(OrderQueue::default());
        world.insert_resource(NotificationBus::default());
        world.insert_resource(EventLog::default());
        world.init_resource::<Messages<OrderAppliedEvent>>();
        world
    }

    fn run_apply(world: &mut World) {
        let mut system_state: SystemState<(
            ResMut<OrderQueue>,
            ResMut<GalaxySnapshot>,
            ResMut<NotificationBus>,
            ResMut<EventLog>,
            MessageWriter<OrderAppliedEvent>,
        )> = SystemState::new(world);
        let (queue, galaxy, bus, log, applied) = system_state.get_mut(world);
        apply_orders(queue, galaxy, bus, log, applied);
        system_state.apply(world);
    }

    #[test]
    fn applied_order_updates_galaxy_and_requests_refresh() {
        let mut world = world_with_fleet();
        let subscription = world
            .resource_mut::<NotificationBus>()
            .subscribe(&[NotificationKind::ScreenRefreshRequired]);
        let route = vec![MapLocation::new(3, 3), MapLocation::new(4, 4)];
        world.resource_mut::<OrderQueue>().submit(Order::SetFleetRoute {
            fleet: FleetId(1),
            route: route.clone(),
        });

        run_apply(&mut world);

        assert!(world.resource::<OrderQueue>().pending.is_empty());
        let galaxy = world.resource::<GalaxySnapshot>();
        assert_eq!(galaxy.fleet(FleetId(1)).map(|f| f.route.clone()), Some(route));
        let delivered = world.resource_mut::<NotificationBus>().take(&subscription);
        assert_eq!(delivered, vec![Notification::ScreenRefreshRequired]);
    }

    #[test]
    fn rejected_order_is_logged_without_refresh() {
        let mut world = world_with_fleet();
        let subscription = world
            .resource_mut::<NotificationBus>()
            .subscribe(&[NotificationKind::ScreenRefreshRequired]);
        world
            .resource_mut::<OrderQueue>()
            .submit(Order::ScrapShip { fleet: FleetId(9) });

        run_apply(&mut world);

        let log = world.resource::<EventLog>();
        assert_eq!(log.entries(), ["Order rejected: Unknown fleet 9".to_string()]);
        assert!(world
            .resource_mut::<NotificationBus>()
            .take(&subscription)
            .is_empty());
    }
}
