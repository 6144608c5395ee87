// Copyright (c) Microsoft Corporation.
// SPDX-License-Identifier: MIT
// This file is part of the UltraHonk prover project.
// See the LICENSE file in the project root for full license information.

//! This module provides implementations of polynomial commitment schemes (PCS).
pub mod ipa_pc;
pub mod kzg_pc;
